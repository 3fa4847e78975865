//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a finished
//! crawl: run metadata, page counts and extracted artifacts.

use crate::output::stats::CrawlSummary;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Glean Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if !summary.config_hash.is_empty() {
        md.push_str(&format!("- **Config Hash**: {}\n", summary.config_hash));
    }
    md.push('\n');

    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Claimed | {} |\n", summary.pages_claimed));
    md.push_str(&format!("| Recorded | {} |\n", summary.pages_recorded));
    md.push_str(&format!(
        "| Without content | {} |\n",
        summary.pages_without_content
    ));
    md.push_str(&format!("| Skipped | {} |\n\n", summary.pages_skipped));
    md.push_str(&format!(
        "- **Record Rate**: {:.2}%\n",
        summary.record_rate()
    ));
    md.push_str(&format!("- **Graph Edges**: {}\n\n", summary.graph_edges));

    md.push_str("## Artifacts\n\n");
    md.push_str("| Artifact | Count |\n");
    md.push_str("|----------|-------|\n");
    md.push_str(&format!("| Text chunks | {} |\n", summary.text_chunks));
    md.push_str(&format!("| Tables | {} |\n", summary.tables_extracted));
    md.push_str(&format!("| Table chunks | {} |\n", summary.table_chunks));
    md.push_str(&format!(
        "| Documents extracted | {} |\n",
        summary.documents_extracted
    ));
    md.push_str(&format!(
        "| Documents failed | {} |\n",
        summary.documents_failed
    ));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::stats::CrawlReport;

    fn create_test_summary() -> CrawlSummary {
        let report = CrawlReport::new("https://site.test/", "abc123");
        for _ in 0..12 {
            CrawlReport::bump(&report.pages_claimed);
        }
        for _ in 0..9 {
            CrawlReport::bump(&report.pages_recorded);
        }
        report.mark_finished();
        report.summary(1234, 2, 1)
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Sumi-Glean Crawl Summary"));
        assert!(markdown.contains("- **Seed**: https://site.test/"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("Finished"));
    }

    #[test]
    fn test_markdown_contains_statistics() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("| Claimed | 12 |"));
        assert!(markdown.contains("| Recorded | 9 |"));
        assert!(markdown.contains("- **Graph Edges**: 1234"));
        assert!(markdown.contains("| Text chunks | 2 |"));
        assert!(markdown.contains("75.00%"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_summary(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Sumi-Glean Crawl Summary"));
    }
}
