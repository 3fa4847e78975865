use crate::config::OutputConfig;
use crate::output::chunks::{text_artifact, ChunkWriter};
use crate::output::record::{ExtractionArtifact, PageRecord};
use crate::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Resolved locations of every crawl output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub results_file: PathBuf,
    pub text_dir: PathBuf,
    pub tables_dir: PathBuf,
    pub documents_dir: PathBuf,
    pub graph_file: PathBuf,
    pub summary_file: Option<PathBuf>,
}

impl OutputLayout {
    /// Resolves every name against the output directory
    pub fn from_config(config: &OutputConfig) -> Self {
        let root = PathBuf::from(&config.directory);
        Self {
            results_file: root.join(&config.results_file),
            text_dir: root.join(&config.text_dir),
            tables_dir: root.join(&config.tables_dir),
            documents_dir: root.join(&config.documents_dir),
            graph_file: root.join(&config.graph_file),
            summary_file: config.summary_path.as_ref().map(|path| root.join(path)),
            root,
        }
    }

    /// Creates the output directories
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.root, &self.text_dir, &self.tables_dir, &self.documents_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// What the aggregator wrote when it finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTotals {
    pub records: usize,
    pub text_chunks: Vec<PathBuf>,
    pub table_chunks: Vec<PathBuf>,
    pub documents: Vec<PathBuf>,
}

/// Collects page records and streams artifacts into consolidated files
///
/// Output is purely additive: nothing accepted is ever rewritten or removed.
#[derive(Debug)]
pub struct Aggregator {
    text: ChunkWriter,
    tables: ChunkWriter,
    records: Mutex<Vec<PageRecord>>,
    documents: Mutex<Vec<PathBuf>>,
    results_file: PathBuf,
}

impl Aggregator {
    pub fn new(layout: &OutputLayout, chunk_bytes: usize) -> Self {
        Self {
            text: ChunkWriter::new(&layout.text_dir, "txt", chunk_bytes),
            tables: ChunkWriter::new(&layout.tables_dir, "csv", chunk_bytes),
            records: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
            results_file: layout.results_file.clone(),
        }
    }

    /// Consumes one artifact
    pub fn accept(&self, artifact: ExtractionArtifact) -> Result<()> {
        match artifact {
            ExtractionArtifact::Text { url, text, .. } => {
                self.text.append(&text_artifact(url.as_str(), &text))
            }
            ExtractionArtifact::Table { table, .. } => {
                let mut unit = table.to_csv()?;
                unit.push('\n');
                self.tables.append(&unit)
            }
            ExtractionArtifact::Document { page_id, url, path } => {
                tracing::trace!("Document {} from page {} at {}", url, page_id, path.display());
                lock(&self.documents).push(path);
                Ok(())
            }
        }
    }

    /// Adds a page to the result set, streaming its text and tables
    pub fn record(&self, page_id: u64, record: PageRecord) -> Result<()> {
        self.accept(ExtractionArtifact::Text {
            page_id,
            url: record.url.clone(),
            text: record.content.clone(),
        })?;

        for table in &record.tables {
            self.accept(ExtractionArtifact::Table {
                page_id,
                table: table.clone(),
            })?;
        }

        lock(&self.records).push(record);
        Ok(())
    }

    /// Flushes the chunk buffers and writes the structured result set
    pub fn finish(&self) -> Result<AggregateTotals> {
        let text_chunks = self.text.finish()?;
        let table_chunks = self.tables.finish()?;

        let records = lock(&self.records);
        let file = File::create(&self.results_file)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &*records)?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} page records to {}",
            records.len(),
            self.results_file.display()
        );

        Ok(AggregateTotals {
            records: records.len(),
            text_chunks,
            table_chunks,
            documents: lock(&self.documents).clone(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
