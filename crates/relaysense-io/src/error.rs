//! I/O error types for relaysense-io.

use std::path::PathBuf;

/// Errors from sensor CSV loading, label encoding, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a required column is absent from the header.
    #[error("missing column \"{column}\" in {path}")]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
    },

    /// Returned when a sensor cell is not a finite float.
    #[error("invalid value in {path}: row {row_index}, column {column}, raw value \"{raw}\"")]
    InvalidValue {
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        column: &'static str,
        raw: String,
    },

    /// Returned when a row has a blank relay status.
    #[error("empty label in {path} at row {row_index}")]
    EmptyLabel { path: PathBuf, row_index: usize },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset { path: PathBuf },

    /// Returned when a label encoder is fitted on no labels.
    #[error("cannot fit a label encoder on an empty label set")]
    EmptyLabelSet,

    /// Returned when a label was not seen while fitting the encoder.
    #[error("unknown label \"{label}\"; known classes: {known:?}")]
    UnknownLabel { label: String, known: Vec<String> },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName { name: String },

    /// Returned when an evaluation record has inconsistent parts.
    #[error("inconsistent evaluation record: {reason}")]
    InconsistentEvaluation { reason: String },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when a result cannot be serialized to JSON.
    #[error("cannot serialize {path}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}
