// crates/fakestore-etl-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cart record {index} is missing a usable products list: {source}")]
    MalformedCart {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("product record {index} is missing id or category: {source}")]
    MalformedProduct {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("column '{column}' holds a value that is not an ISO-8601 UTC timestamp: {detail}")]
    Timestamp { column: String, detail: String },

    #[error("unsupported output format '{0}', expected csv, json or parquet")]
    InvalidFormat(String),

    #[error("Data processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
