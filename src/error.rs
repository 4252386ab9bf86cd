use thiserror::Error;

/// Failures of the grid loader boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Header row {header_row} is outside the sheet ({rows} rows)")]
    HeaderOutOfRange { header_row: usize, rows: usize },
}

/// Fatal failures surfaced by the public analysis entry points
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("No viable structure found in {0}")]
    NoViableStructure(String),

    #[error("Failed to load sheet: {0}")]
    Load(#[from] LoadError),
}

/// Problems recovered locally while extracting the meter hierarchy.
///
/// These never abort a parse; their display text ends up in the report's
/// `errors` / `warnings` lists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionWarning {
    #[error("Partial extraction at row {row}: {msg}")]
    PartialExtraction { row: usize, msg: String },

    #[error("JSON serialization check failed: {0}")]
    SerializationGuardTripped(String),
}
