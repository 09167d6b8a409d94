use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

use crate::constants::APOD_API_URL;
use crate::error::{PipelineError, Result};

/// Client for the APOD date-range endpoint.
pub struct ApodClient {
    client: reqwest::Client,
}

impl ApodClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Issue the single GET for an inclusive date range and return the raw
    /// response body. Thumbnails are always requested so video entries carry
    /// a usable still image.
    pub async fn fetch_range(
        &self,
        api_key: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<u8>> {
        let start = start_date.to_string();
        let end = end_date.to_string();
        let response = self
            .client
            .get(APOD_API_URL)
            .query(&[
                ("api_key", api_key),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("thumbs", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Status {
                code: status.as_u16(),
                url: APOD_API_URL.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from APOD endpoint", bytes.len());
        Ok(bytes.to_vec())
    }
}
