use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid step number: {0}")]
    InvalidStep(u8),
    #[error("The {kind} file should be a {ext} file, check that the file name ends with .{ext}: {path:?}")]
    InvalidExtension {
        kind: &'static str,
        ext: &'static str,
        path: PathBuf,
    },
    #[error("I/O error for {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Root(String),
    #[error("Missing input column: {0}")]
    MissingColumn(String),
    #[error("Inconsistent length of column {column} in event {event}")]
    ColumnLength { column: String, event: usize },
    #[error("Unable to retrieve a required histogram, please make sure that the input file was run up to the required step. The missing histogram is named: {0}")]
    MissingHistogram(String),
    #[error("Histogram {name} is not a {expected}")]
    HistogramKind {
        name: String,
        expected: &'static str,
    },
    #[error("Duplicate histogram name: {0}")]
    DuplicateHistogram(String),
    #[error("Failed to (de)serialise {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to render plot: {0}")]
    Render(String),
    #[error("Failed to create pdf: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, Error>;
