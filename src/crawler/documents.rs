//! Document pipeline for linked PDFs
//!
//! Document references found on pages are downloaded and converted to text
//! off the page workers:
//! - Each document URL is processed at most once per crawl
//! - Jobs travel over an unbounded channel to a dispatcher task
//! - The dispatcher runs jobs concurrently, bounded by a semaphore
//! - A failed document never affects the page that linked it

use crate::crawler::fetcher::{Fetcher, PoliteDelay};
use crate::output::{Aggregator, CrawlReport, ExtractionArtifact};
use crate::url::CanonicalUrl;
use crate::GleanError;
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

/// One document to download and extract
#[derive(Debug, Clone)]
struct DocumentJob {
    page_id: u64,
    url: CanonicalUrl,
}

/// Shared state of running jobs
#[derive(Debug)]
struct JobContext {
    fetcher: Fetcher,
    aggregator: Arc<Aggregator>,
    report: Arc<CrawlReport>,
    directory: PathBuf,
    delay: PoliteDelay,
    stems: DashSet<String>,
}

/// Decoupled download and text extraction of linked documents
#[derive(Debug)]
pub struct DocumentPipeline {
    seen: DashSet<CanonicalUrl>,
    sender: Mutex<Option<mpsc::UnboundedSender<DocumentJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl DocumentPipeline {
    /// Starts the dispatcher task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        fetcher: Fetcher,
        aggregator: Arc<Aggregator>,
        report: Arc<CrawlReport>,
        directory: PathBuf,
        concurrency: usize,
        delay: PoliteDelay,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let context = Arc::new(JobContext {
            fetcher,
            aggregator,
            report,
            directory,
            delay,
            stems: DashSet::new(),
        });
        let dispatcher = tokio::spawn(dispatch(receiver, context, concurrency.max(1)));

        Self {
            seen: DashSet::new(),
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Queues a document, returning false if it was already submitted or
    /// the pipeline is shut down
    pub fn submit(&self, page_id: u64, url: CanonicalUrl) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }

        let sender = self.sender.lock().unwrap_or_else(|p| p.into_inner());
        match sender.as_ref() {
            Some(sender) => sender.send(DocumentJob { page_id, url }).is_ok(),
            None => false,
        }
    }

    /// Number of distinct documents submitted
    pub fn submitted(&self) -> usize {
        self.seen.len()
    }

    /// Closes the queue and waits for every outstanding job
    pub async fn shutdown(&self) {
        drop(self.sender.lock().unwrap_or_else(|p| p.into_inner()).take());

        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(dispatcher) = dispatcher {
            if let Err(e) = dispatcher.await {
                tracing::error!("Document dispatcher failed: {}", e);
            }
        }
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<DocumentJob>,
    context: Arc<JobContext>,
    concurrency: usize,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut jobs = JoinSet::new();

    while let Some(job) = receiver.recv().await {
        while let Some(finished) = jobs.try_join_next() {
            log_join_error(finished);
        }

        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let context = Arc::clone(&context);
        jobs.spawn(async move {
            let _permit = permit;
            process_document(&context, job).await;
        });
    }

    while let Some(result) = jobs.join_next().await {
        log_join_error(result);
    }
}

fn log_join_error(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!("Document job panicked: {}", e);
    }
}

async fn process_document(context: &JobContext, job: DocumentJob) {
    match extract_document(context, &job).await {
        Ok(path) => {
            CrawlReport::bump(&context.report.documents_extracted);
            tracing::info!("Extracted document {}", job.url);
            let artifact = ExtractionArtifact::Document {
                page_id: job.page_id,
                url: job.url,
                path,
            };
            if let Err(e) = context.aggregator.accept(artifact) {
                tracing::warn!("Failed to record document: {}", e);
            }
        }
        Err(e) => {
            CrawlReport::bump(&context.report.documents_failed);
            tracing::warn!("Document {} failed: {}", job.url, e);
        }
    }
}

/// Downloads, saves and converts one document, returning the text path
async fn extract_document(context: &JobContext, job: &DocumentJob) -> crate::Result<PathBuf> {
    context.delay.wait().await;
    let bytes = context
        .fetcher
        .fetch_document(job.url.as_url())
        .await
        .map_err(|e| GleanError::Output(format!("download failed: {}", e)))?;

    let stem = unique_stem(&context.stems, &file_stem(job.url.as_url().path()));
    let pdf_path = context.directory.join(format!("{}.pdf", stem));
    tokio::fs::write(&pdf_path, &bytes).await?;

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| GleanError::Output(format!("extraction aborted: {}", e)))?
    .map_err(|e| GleanError::Output(format!("extraction failed: {}", e)))?;

    let text_path = context.directory.join(format!("{}.txt", stem));
    tokio::fs::write(&text_path, text.as_bytes()).await?;
    Ok(text_path)
}

/// File name stem for a document path, extension removed
fn file_stem(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or("");
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

/// Claims `stem`, or the first free `stem-<n>`
fn unique_stem(stems: &DashSet<String>, stem: &str) -> String {
    if stems.insert(stem.to_string()) {
        return stem.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", stem, n))
        .find(|candidate| stems.insert(candidate.clone()))
        .unwrap_or_else(|| stem.to_string())
}
