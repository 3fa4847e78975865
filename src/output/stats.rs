//! Crawl statistics
//!
//! Workers bump the counters of a shared [`CrawlReport`] while the crawl runs;
//! [`CrawlReport::summary`] freezes them into a [`CrawlSummary`] for printing
//! and the markdown report.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Live counters of a running crawl
#[derive(Debug)]
pub struct CrawlReport {
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    seed_url: String,
    config_hash: String,

    pub pages_claimed: AtomicU64,
    pub pages_recorded: AtomicU64,
    /// Non-HTML, unreachable or malformed pages
    pub pages_skipped: AtomicU64,
    pub pages_without_content: AtomicU64,
    pub documents_extracted: AtomicU64,
    pub documents_failed: AtomicU64,
    pub tables_extracted: AtomicU64,
}

impl CrawlReport {
    pub fn new(seed_url: impl Into<String>, config_hash: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: Mutex::new(None),
            seed_url: seed_url.into(),
            config_hash: config_hash.into(),
            pages_claimed: AtomicU64::new(0),
            pages_recorded: AtomicU64::new(0),
            pages_skipped: AtomicU64::new(0),
            pages_without_content: AtomicU64::new(0),
            documents_extracted: AtomicU64::new(0),
            documents_failed: AtomicU64::new(0),
            tables_extracted: AtomicU64::new(0),
        }
    }

    /// Increments a counter by one
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_finished(&self) {
        let mut finished = self
            .finished_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *finished = Some(Utc::now());
    }

    /// Freezes the counters, adding the totals only known at the end
    pub fn summary(&self, graph_edges: u64, text_chunks: u64, table_chunks: u64) -> CrawlSummary {
        let finished_at = *self
            .finished_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        CrawlSummary {
            seed_url: self.seed_url.clone(),
            config_hash: self.config_hash.clone(),
            started_at: self.started_at,
            finished_at,
            pages_claimed: self.pages_claimed.load(Ordering::Relaxed),
            pages_recorded: self.pages_recorded.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            pages_without_content: self.pages_without_content.load(Ordering::Relaxed),
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            tables_extracted: self.tables_extracted.load(Ordering::Relaxed),
            graph_edges,
            text_chunks,
            table_chunks,
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub seed_url: String,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_claimed: u64,
    pub pages_recorded: u64,
    pub pages_skipped: u64,
    pub pages_without_content: u64,
    pub documents_extracted: u64,
    pub documents_failed: u64,
    pub tables_extracted: u64,
    pub graph_edges: u64,
    pub text_chunks: u64,
    pub table_chunks: u64,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of claimed pages that produced a record
    pub fn record_rate(&self) -> f64 {
        if self.pages_claimed == 0 {
            0.0
        } else {
            (self.pages_recorded as f64 / self.pages_claimed as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(summary: &CrawlSummary) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Seed: {}", summary.seed_url);
    println!("  Pages claimed: {}", summary.pages_claimed);
    println!("  Pages recorded: {}", summary.pages_recorded);
    println!("  Pages without content: {}", summary.pages_without_content);
    println!("  Pages skipped: {}", summary.pages_skipped);
    println!("  Graph edges: {}", summary.graph_edges);
    println!();

    println!("Artifacts:");
    println!("  Tables: {} in {} chunks", summary.tables_extracted, summary.table_chunks);
    println!("  Text chunks: {}", summary.text_chunks);
    println!(
        "  Documents: {} extracted, {} failed",
        summary.documents_extracted, summary.documents_failed
    );
    println!();

    println!(
        "Record Rate: {:.1}% ({} / {} pages recorded)",
        summary.record_rate(),
        summary.pages_recorded,
        summary.pages_claimed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_frozen_into_summary() {
        let report = CrawlReport::new("https://site.test/", "abc123");
        CrawlReport::bump(&report.pages_claimed);
        CrawlReport::bump(&report.pages_claimed);
        CrawlReport::bump(&report.pages_recorded);
        CrawlReport::bump(&report.documents_failed);
        report.mark_finished();

        let summary = report.summary(4, 1, 0);
        assert_eq!(summary.pages_claimed, 2);
        assert_eq!(summary.pages_recorded, 1);
        assert_eq!(summary.documents_failed, 1);
        assert_eq!(summary.graph_edges, 4);
        assert_eq!(summary.text_chunks, 1);
        assert_eq!(summary.config_hash, "abc123");
        assert!(summary.finished_at.is_some());
        assert!(summary.duration_seconds().unwrap() >= 0);
    }

    #[test]
    fn test_record_rate() {
        let report = CrawlReport::new("https://site.test/", "");
        assert_eq!(report.summary(0, 0, 0).record_rate(), 0.0);

        for _ in 0..4 {
            CrawlReport::bump(&report.pages_claimed);
        }
        CrawlReport::bump(&report.pages_recorded);
        assert_eq!(report.summary(0, 0, 0).record_rate(), 25.0);
    }
}
