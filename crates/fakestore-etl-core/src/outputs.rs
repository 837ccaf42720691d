use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::str::FromStr;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Parquet,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Parquet => "parquet",
        }
    }
}

impl FromStr for FileFormat {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "parquet" => Ok(FileFormat::Parquet),
            other => Err(PipelineError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

struct SummaryRow {
    user_id: i64,
    most_relevant_category: String,
    last_date_add_to_cart: String,
    processing_date: String,
}

/// Column-first serialization of the summary, keyed by column name and then
/// by row index, matching the layout downstream consumers already read.
#[derive(Serialize)]
struct ColumnOriented {
    user_id: BTreeMap<String, i64>,
    most_relevant_category: BTreeMap<String, String>,
    last_date_add_to_cart: BTreeMap<String, String>,
    processing_date: BTreeMap<String, String>,
}

/// Writes the summary table to `{file_name}.{ext}` in the requested format.
/// An empty summary still produces a validly-formatted empty file.
pub fn persist(df: &DataFrame, file_name: &str, format: FileFormat) -> Result<()> {
    let path = format!("{}.{}", file_name, format.extension());
    match format {
        FileFormat::Csv => write_csv(df, &path)?,
        FileFormat::Json => write_json(df, &path)?,
        FileFormat::Parquet => write_parquet(df, &path)?,
    }
    info!(path = %path, "Data successfully persisted");
    Ok(())
}

/// Header plus one record per row, with a row-index column first (empty
/// header cell), mirroring default tabular-to-CSV serialization.
fn write_csv(df: &DataFrame, path: &str) -> Result<()> {
    let rows = collect_rows(df)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "",
        "user_id",
        "most_relevant_category",
        "last_date_add_to_cart",
        "processing_date",
    ])?;
    for (index, row) in rows.iter().enumerate() {
        writer.write_record([
            index.to_string(),
            row.user_id.to_string(),
            row.most_relevant_category.clone(),
            row.last_date_add_to_cart.clone(),
            row.processing_date.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(df: &DataFrame, path: &str) -> Result<()> {
    let rows = collect_rows(df)?;
    let mut out = ColumnOriented {
        user_id: BTreeMap::new(),
        most_relevant_category: BTreeMap::new(),
        last_date_add_to_cart: BTreeMap::new(),
        processing_date: BTreeMap::new(),
    };
    for (index, row) in rows.iter().enumerate() {
        let key = index.to_string();
        out.user_id.insert(key.clone(), row.user_id);
        out.most_relevant_category
            .insert(key.clone(), row.most_relevant_category.clone());
        out.last_date_add_to_cart
            .insert(key.clone(), row.last_date_add_to_cart.clone());
        out.processing_date.insert(key, row.processing_date.clone());
    }

    let file = File::create(path)?;
    serde_json::to_writer(file, &out)?;
    Ok(())
}

fn write_parquet(df: &DataFrame, path: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut frame = df.clone();
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Uncompressed)
        .with_statistics(StatisticsOptions::default())
        .finish(&mut frame)?;
    Ok(())
}

fn collect_rows(df: &DataFrame) -> Result<Vec<SummaryRow>> {
    let user_ids = df.column("user_id")?.as_materialized_series().i64()?.clone();
    let categories = df
        .column("most_relevant_category")?
        .as_materialized_series()
        .str()?
        .clone();
    let dates = df
        .column("last_date_add_to_cart")?
        .as_materialized_series()
        .str()?
        .clone();
    let processing_dates = df
        .column("processing_date")?
        .as_materialized_series()
        .str()?
        .clone();

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(user_id), Some(category), Some(date), Some(processing_date)) = (
            user_ids.get(idx),
            categories.get(idx),
            dates.get(idx),
            processing_dates.get(idx),
        ) else {
            return Err(PipelineError::Processing(format!(
                "summary row {idx} holds a null field"
            )));
        };
        rows.push(SummaryRow {
            user_id,
            most_relevant_category: category.to_string(),
            last_date_add_to_cart: date.to_string(),
            processing_date: processing_date.to_string(),
        });
    }

    Ok(rows)
}
