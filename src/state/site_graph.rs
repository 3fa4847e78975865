use crate::url::CanonicalUrl;
use crate::Result;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

/// Directed page-to-page links discovered during traversal
///
/// Edges are deduplicated per source and never removed. Workers record into
/// the graph concurrently; each source key is locked independently.
#[derive(Debug, Default)]
pub struct SiteGraph {
    edges: DashMap<CanonicalUrl, BTreeSet<CanonicalUrl>>,
}

impl SiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edge, returning true if it was not already present
    pub fn record(&self, source: &CanonicalUrl, target: &CanonicalUrl) -> bool {
        self.edges
            .entry(source.clone())
            .or_default()
            .insert(target.clone())
    }

    /// Records every target of one source page
    pub fn record_all<'a, I>(&self, source: &CanonicalUrl, targets: I) -> usize
    where
        I: IntoIterator<Item = &'a CanonicalUrl>,
    {
        let mut entry = self.edges.entry(source.clone()).or_default();
        targets
            .into_iter()
            .filter(|target| entry.insert((*target).clone()))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns all edges sorted by source, then target
    pub fn edges(&self) -> Vec<(CanonicalUrl, CanonicalUrl)> {
        let mut edges: Vec<(CanonicalUrl, CanonicalUrl)> = self
            .edges
            .iter()
            .flat_map(|entry| {
                let source = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(|target| (source.clone(), target.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        edges.sort();
        edges
    }

    /// Writes the graph as a `source,target` CSV file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["source", "target"])?;

        for (source, target) in self.edges() {
            writer.write_record([source.as_str(), target.as_str()])?;
        }

        writer.flush()?;
        tracing::debug!("Wrote {} graph edges to {}", self.edge_count(), path.display());
        Ok(())
    }
}
