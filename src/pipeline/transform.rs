use chrono::NaiveDate;
use metrics::{counter, histogram};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::types::{ApodResponse, MediaType, RawApodRecord, StagedRow};

#[derive(Debug)]
pub struct TransformSummary {
    pub records_read: usize,
    pub rows_written: usize,
    pub rows_dropped: usize,
    pub artifact: PathBuf,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Pick the image reference for a record. Videos use their thumbnail still;
/// everything else falls back through url and hdurl, ending at an empty
/// string rather than failing the row.
pub fn resolve_image_url(record: &RawApodRecord) -> String {
    if record.media_type == MediaType::Video {
        if let Some(thumbnail) = non_empty(&record.thumbnail_url) {
            return thumbnail.to_string();
        }
    }
    non_empty(&record.url)
        .or_else(|| non_empty(&record.hdurl))
        .unwrap_or("")
        .to_string()
}

/// Normalize one raw record into a staged row. Fails only on an unparseable
/// date; missing text fields become empty strings.
pub fn stage_record(record: &RawApodRecord) -> Result<StagedRow> {
    let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
        .map_err(|e| PipelineError::Parse(format!("bad date '{}': {e}", record.date)))?;

    Ok(StagedRow {
        date,
        title: record.title.clone().unwrap_or_default(),
        explanation: record.explanation.clone().unwrap_or_default(),
        media_type: record.media_type,
        image_url: resolve_image_url(record),
    })
}

/// Normalize a raw sequence in input order, dropping records whose date will
/// not parse.
pub fn normalize_records(records: &[RawApodRecord]) -> (Vec<StagedRow>, usize) {
    let mut rows = Vec::with_capacity(records.len());
    let mut dropped = 0;
    for record in records {
        match stage_record(record) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    "Skipping record '{}': {}",
                    record.title.as_deref().unwrap_or("<untitled>"),
                    e
                );
                dropped += 1;
            }
        }
    }
    (rows, dropped)
}

fn write_staged_artifact(path: &Path, rows: &[StagedRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))?;

    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[instrument(skip(config))]
pub fn run(config: &Config) -> Result<TransformSummary> {
    counter!("apod_transform_runs_total").increment(1);
    let started = Instant::now();

    let raw_path = config.raw_artifact_path();
    if !raw_path.exists() {
        return Err(PipelineError::MissingInput(format!(
            "{} does not exist. Run the extract stage first.",
            raw_path.display()
        )));
    }

    let body = fs::read(&raw_path)?;
    let records = serde_json::from_slice::<ApodResponse>(&body)?.into_records();
    let (rows, dropped) = normalize_records(&records);

    let artifact = config.staged_artifact_path();
    write_staged_artifact(&artifact, &rows)?;

    counter!("apod_rows_staged_total").increment(rows.len() as u64);
    histogram!("apod_transform_duration_seconds").record(started.elapsed().as_secs_f64());
    info!(
        "Staged {} rows to {} ({} dropped)",
        rows.len(),
        artifact.display(),
        dropped
    );

    Ok(TransformSummary {
        records_read: records.len(),
        rows_written: rows.len(),
        rows_dropped: dropped,
        artifact,
    })
}
