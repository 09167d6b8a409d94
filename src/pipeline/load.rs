use metrics::{counter, histogram};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::storage::ApodStorage;
use crate::types::StagedRow;

#[derive(Debug)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub batches: usize,
    pub rows_upserted: usize,
    pub failed_batches: Vec<String>,
}

/// Read the staged artifact into rows, skipping rows that do not
/// deserialize. An absent file or one with no usable rows is a missing
/// input.
pub fn read_staged_rows(path: &Path) -> Result<Vec<StagedRow>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(format!(
            "{} does not exist. Run the transform stage first.",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<StagedRow>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping unreadable staged row: {}", e),
        }
    }

    if rows.is_empty() {
        return Err(PipelineError::MissingInput(format!(
            "{} contains no staged rows",
            path.display()
        )));
    }
    Ok(rows)
}

/// Upsert the staged rows in fixed-size batches. Committed batches stay
/// committed on failure; `keep_going` decides whether later batches are
/// still attempted after one fails.
#[instrument(skip(config, storage))]
pub async fn run(
    config: &Config,
    storage: Arc<dyn ApodStorage>,
    keep_going: bool,
) -> Result<LoadSummary> {
    counter!("apod_load_runs_total").increment(1);
    let started = Instant::now();

    let staged_path = config.staged_artifact_path();
    let rows = read_staged_rows(&staged_path)?;
    info!(
        "Read {} staged rows from {}",
        rows.len(),
        staged_path.display()
    );

    let batch_size = config.load.batch_size;
    let batches: Vec<&[StagedRow]> = rows.chunks(batch_size).collect();
    let mut rows_upserted = 0;
    let mut failed_batches = Vec::new();

    for (index, batch) in batches.iter().enumerate() {
        let first = index * batch_size + 1;
        let last = first + batch.len() - 1;

        match storage.upsert_batch(batch).await {
            Ok(()) => {
                rows_upserted += batch.len();
                counter!("apod_rows_upserted_total").increment(batch.len() as u64);
                info!("Upserted rows {} to {}", first, last);
                println!("   Upserted rows {first} to {last}");
            }
            Err(e) => {
                counter!("apod_load_batch_errors_total").increment(1);
                let message = format!("batch {} (rows {first}-{last}) failed: {e}", index + 1);
                if keep_going {
                    warn!("{message}; continuing with remaining batches");
                    failed_batches.push(message);
                } else {
                    return Err(PipelineError::Database { message });
                }
            }
        }

        if index + 1 < batches.len() && config.load.batch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.load.batch_delay_ms)).await;
        }
    }

    histogram!("apod_load_duration_seconds").record(started.elapsed().as_secs_f64());
    Ok(LoadSummary {
        rows_read: rows.len(),
        batches: batches.len(),
        rows_upserted,
        failed_batches,
    })
}
