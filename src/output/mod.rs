//! Output module for crawl results and reports
//!
//! This module handles:
//! - Per-page records and extraction artifacts
//! - Streaming text and tables into size-bounded consolidated files
//! - Writing the structured result set
//! - Crawl statistics and the markdown summary

mod aggregator;
mod chunks;
mod markdown;
mod record;
pub mod stats;

pub use aggregator::{AggregateTotals, Aggregator, OutputLayout};
pub use chunks::{text_artifact, ChunkWriter};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use record::{ExtractionArtifact, PageRecord, Table};
pub use stats::{print_statistics, CrawlReport, CrawlSummary};
