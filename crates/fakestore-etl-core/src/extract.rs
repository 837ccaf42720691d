use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com";

/// Fetches one collection from the store API as raw JSON records.
///
/// A non-200 response is logged and degrades to an empty collection so the
/// rest of the pipeline still runs; transport-level failures propagate.
pub fn fetch(client: &Client, base_url: &str, endpoint: &str) -> Result<Vec<Value>> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), endpoint);
    let response = client.get(&url).send()?;
    let status = response.status();

    if status != StatusCode::OK {
        error!(url = %url, status = status.as_u16(), "API request error");
        return Ok(Vec::new());
    }

    let records: Vec<Value> = response.json()?;
    info!(url = %url, records = records.len(), "API data extraction completed");
    Ok(records)
}
