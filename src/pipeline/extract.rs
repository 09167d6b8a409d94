use chrono::{Local, NaiveDate};
use metrics::{counter, histogram};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

use crate::apis::ApodClient;
use crate::config::Config;
use crate::error::Result;
use crate::types::ApodResponse;

#[derive(Debug)]
pub struct ExtractSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub records: usize,
    pub artifact: PathBuf,
}

/// Date range for a lookback window: N days back through today, inclusive,
/// so the range spans N+1 calendar days.
pub fn compute_date_range(today: NaiveDate, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    (today - chrono::Duration::days(i64::from(lookback_days)), today)
}

/// Replace the raw artifact in one rename so a failed fetch never leaves a
/// partial file behind.
pub fn write_raw_artifact(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[instrument(skip(config, api_key))]
pub async fn run(config: &Config, api_key: &str) -> Result<ExtractSummary> {
    counter!("apod_extract_runs_total").increment(1);
    let started = Instant::now();

    let today = Local::now().date_naive();
    let (start_date, end_date) = compute_date_range(today, config.extract.lookback_days);
    info!("Fetching APOD records from {} to {}", start_date, end_date);

    let client = ApodClient::new(Duration::from_secs(config.extract.timeout_seconds))?;
    let body = client.fetch_range(api_key, start_date, end_date).await?;

    // Count records for the summary; the artifact keeps the body verbatim.
    let records = serde_json::from_slice::<ApodResponse>(&body)?
        .into_records()
        .len();

    let artifact = config.raw_artifact_path();
    write_raw_artifact(&artifact, &body)?;

    counter!("apod_records_fetched_total").increment(records as u64);
    histogram!("apod_extract_duration_seconds").record(started.elapsed().as_secs_f64());
    info!("Wrote {} records to {}", records, artifact.display());

    Ok(ExtractSummary {
        start_date,
        end_date,
        records,
        artifact,
    })
}
