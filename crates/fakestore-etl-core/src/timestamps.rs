use chrono::DateTime;
use chrono_tz::Tz;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Civil time zone all rendered timestamps are expressed in.
pub const OUTPUT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Fixed-width render format. Zero-padded, so lexicographic order on the
/// rendered strings matches chronological order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rewrites the named string columns from ISO-8601 UTC timestamps (fractional
/// seconds, trailing `Z`) to Sao Paulo wall-clock time rendered as
/// `YYYY-MM-DD HH:MM:SS`. Sub-second precision is truncated. Any value that
/// does not parse is fatal.
pub fn normalize_datetime(mut df: DataFrame, columns: &[&str]) -> Result<DataFrame> {
    for &column in columns {
        let values = df
            .column(column)?
            .as_materialized_series()
            .str()?
            .clone();

        let mut rendered: Vec<String> = Vec::with_capacity(values.len());
        for idx in 0..values.len() {
            let value = values.get(idx).ok_or_else(|| PipelineError::Timestamp {
                column: column.to_string(),
                detail: format!("null value at row {idx}"),
            })?;
            let parsed =
                DateTime::parse_from_rfc3339(value).map_err(|err| PipelineError::Timestamp {
                    column: column.to_string(),
                    detail: format!("'{value}': {err}"),
                })?;
            rendered.push(
                parsed
                    .with_timezone(&OUTPUT_TIMEZONE)
                    .format(DATETIME_FORMAT)
                    .to_string(),
            );
        }

        df.with_column(Series::new(column.into(), rendered))?;
    }

    Ok(df)
}
