use chrono::{DateTime, Utc};
use polars::prelude::*;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::info;

use crate::aggregate::aggregate;
use crate::error::Result;
use crate::extract::{fetch, DEFAULT_BASE_URL};
use crate::flatten::normalize_and_join;
use crate::outputs::{persist, FileFormat};
use crate::timestamps::{normalize_datetime, DATETIME_FORMAT, OUTPUT_TIMEZONE};

pub const OUTPUT_FILE_STEM: &str = "fake_store_analytics";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_url: String,
    pub file_name: String,
    pub format: FileFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            file_name: OUTPUT_FILE_STEM.to_string(),
            format: FileFormat::Csv,
        }
    }
}

/// Runs the whole extract-transform-load batch once.
pub fn run(config: &PipelineConfig) -> Result<()> {
    info!("Extracting data");
    let client = Client::new();
    let carts = fetch(&client, &config.base_url, "carts")?;
    let products = fetch(&client, &config.base_url, "products")?;

    info!("Starting data transformation");
    let summary = transform(&carts, &products, Utc::now())?;

    info!("Loading data");
    persist(&summary, &config.file_name, config.format)
}

/// Transformation core, separated from network and file I/O so the clock can
/// be injected and runs stay reproducible under test.
pub fn transform(
    carts: &[Value],
    products: &[Value],
    processed_at: DateTime<Utc>,
) -> Result<DataFrame> {
    let joined = normalize_and_join(carts, products)?;
    let joined = normalize_datetime(joined, &["date"])?;
    let mut summary = aggregate(&joined)?;

    let processing_date = processed_at
        .with_timezone(&OUTPUT_TIMEZONE)
        .format(DATETIME_FORMAT)
        .to_string();
    let height = summary.height();
    summary.with_column(Series::new(
        "processing_date".into(),
        vec![processing_date; height],
    ))?;

    let summary = summary
        .lazy()
        .rename(
            ["userId", "category"],
            ["user_id", "most_relevant_category"],
            true,
        )
        .collect()?;

    Ok(summary)
}
