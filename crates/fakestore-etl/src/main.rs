// crates/fakestore-etl/src/main.rs

use anyhow::Result;
use clap::Parser;
use fakestore_etl_core::extract::DEFAULT_BASE_URL;
use fakestore_etl_core::outputs::FileFormat;
use fakestore_etl_core::pipeline::{self, PipelineConfig, OUTPUT_FILE_STEM};
use tracing_subscriber::EnvFilter;

/// Batch ETL for the Fake Store API: pulls carts and products, aggregates
/// per-user cart analytics and writes them to a local file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output file format: csv, json or parquet.
    #[arg(long, default_value = "csv")]
    format: FileFormat,

    /// Base name of the output file; the extension follows the format.
    #[arg(long, default_value = OUTPUT_FILE_STEM)]
    output: String,

    /// Base URL of the store API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig {
        base_url: cli.base_url,
        file_name: cli.output,
        format: cli.format,
    };

    pipeline::run(&config)?;
    Ok(())
}
