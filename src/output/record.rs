use crate::url::CanonicalUrl;
use serde::Serialize;
use std::path::PathBuf;

/// One extracted table: a header row plus data rows of equal width
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Serializes the table as CSV, header first
    pub fn to_csv(&self) -> crate::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::GleanError::Output(format!("CSV buffer: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| crate::GleanError::Output(e.to_string()))
    }
}

/// Per-page result entry of `output.json`
///
/// Tables and document references ride along for the aggregator but are
/// not part of the serialized result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: CanonicalUrl,
    pub title: String,
    pub content: String,
    pub content_secondary_language: String,
    /// Sorted, unique
    pub links: Vec<CanonicalUrl>,
    #[serde(skip_serializing)]
    pub tables: Vec<Table>,
    #[serde(skip_serializing)]
    pub documents: Vec<CanonicalUrl>,
}

/// A unit of extracted output, tagged with the claim sequence number of
/// the page it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionArtifact {
    Text {
        page_id: u64,
        url: CanonicalUrl,
        text: String,
    },
    Table {
        page_id: u64,
        table: Table,
    },
    Document {
        page_id: u64,
        url: CanonicalUrl,
        /// Extracted text file next to the saved document
        path: PathBuf,
    },
}
