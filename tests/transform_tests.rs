use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use apod_pipeline::config::Config;
use apod_pipeline::error::PipelineError;
use apod_pipeline::pipeline::transform::{self, normalize_records, resolve_image_url, stage_record};
use apod_pipeline::types::{MediaType, RawApodRecord};

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.data.dir = dir.to_path_buf();
    config
}

fn write_raw_artifact(config: &Config, body: &serde_json::Value) -> Result<()> {
    let path = config.raw_artifact_path();
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, serde_json::to_vec(body)?)?;
    Ok(())
}

fn image_record(date: &str) -> RawApodRecord {
    RawApodRecord {
        date: date.to_string(),
        title: Some("Test Title".to_string()),
        explanation: Some("Test explanation".to_string()),
        copyright: None,
        url: Some("https://example.com/image.jpg".to_string()),
        hdurl: Some("https://example.com/image_hd.jpg".to_string()),
        thumbnail_url: None,
        media_type: MediaType::Image,
        service_version: Some("v1".to_string()),
    }
}

#[test]
fn single_object_and_single_element_array_stage_identically() -> Result<()> {
    let record = json!({
        "date": "2025-12-09",
        "title": "Lunar Eclipse",
        "explanation": "The Moon darkens.",
        "media_type": "image",
        "url": "https://example.com/moon.jpg",
        "service_version": "v1"
    });

    let object_dir = tempdir()?;
    let object_config = test_config(object_dir.path());
    write_raw_artifact(&object_config, &record)?;
    let object_summary = transform::run(&object_config)?;

    let array_dir = tempdir()?;
    let array_config = test_config(array_dir.path());
    write_raw_artifact(&array_config, &json!([record]))?;
    let array_summary = transform::run(&array_config)?;

    assert_eq!(object_summary.rows_written, 1);
    assert_eq!(array_summary.rows_written, 1);

    let object_csv = fs::read_to_string(object_config.staged_artifact_path())?;
    let array_csv = fs::read_to_string(array_config.staged_artifact_path())?;
    assert_eq!(object_csv, array_csv);
    Ok(())
}

#[test]
fn video_rows_use_thumbnail_not_playback_url() {
    let mut record = image_record("2025-12-09");
    record.media_type = MediaType::Video;
    record.url = Some("https://youtube.com/watch?v=abc".to_string());
    record.thumbnail_url = Some("https://img.youtube.com/vi/abc/0.jpg".to_string());

    assert_eq!(
        resolve_image_url(&record),
        "https://img.youtube.com/vi/abc/0.jpg"
    );
}

#[test]
fn video_without_thumbnail_falls_back_to_url() {
    let mut record = image_record("2025-12-09");
    record.media_type = MediaType::Video;
    record.url = Some("https://youtube.com/watch?v=abc".to_string());
    record.thumbnail_url = None;

    assert_eq!(resolve_image_url(&record), "https://youtube.com/watch?v=abc");
}

#[test]
fn image_rows_use_url() {
    let record = image_record("2025-12-09");
    assert_eq!(resolve_image_url(&record), "https://example.com/image.jpg");
}

#[test]
fn hdurl_is_the_fallback_when_url_is_missing() {
    let mut record = image_record("2025-12-09");
    record.url = None;
    assert_eq!(resolve_image_url(&record), "https://example.com/image_hd.jpg");

    record.url = Some(String::new());
    assert_eq!(resolve_image_url(&record), "https://example.com/image_hd.jpg");
}

#[test]
fn all_absent_image_reference_stays_empty() {
    let mut record = image_record("2025-12-09");
    record.url = None;
    record.hdurl = None;

    let row = stage_record(&record).unwrap();
    assert_eq!(row.image_url, "");
    assert_eq!(row.title, "Test Title");
}

#[test]
fn missing_title_and_explanation_become_empty_strings() {
    let mut record = image_record("2025-12-09");
    record.title = None;
    record.explanation = None;

    let row = stage_record(&record).unwrap();
    assert_eq!(row.title, "");
    assert_eq!(row.explanation, "");
}

#[test]
fn unparseable_date_is_dropped_not_fatal() {
    let records = vec![
        image_record("2025-12-08"),
        image_record("not-a-date"),
        image_record("2025-12-09"),
    ];

    let (rows, dropped) = normalize_records(&records);
    assert_eq!(rows.len(), 2);
    assert_eq!(dropped, 1);
    assert_eq!(rows[0].date.to_string(), "2025-12-08");
    assert_eq!(rows[1].date.to_string(), "2025-12-09");
}

#[test]
fn input_order_is_preserved() {
    let records = vec![
        image_record("2025-12-09"),
        image_record("2025-12-07"),
        image_record("2025-12-08"),
    ];

    let (rows, _) = normalize_records(&records);
    let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-12-09", "2025-12-07", "2025-12-08"]);
}

#[test]
fn unknown_media_type_is_treated_as_image() -> Result<()> {
    let record: RawApodRecord = serde_json::from_value(json!({
        "date": "2025-12-09",
        "media_type": "interactive"
    }))?;
    assert_eq!(record.media_type, MediaType::Image);

    let record: RawApodRecord = serde_json::from_value(json!({ "date": "2025-12-09" }))?;
    assert_eq!(record.media_type, MediaType::Image);
    Ok(())
}

#[test]
fn staged_artifact_matches_expected_tabular_form() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path());
    write_raw_artifact(
        &config,
        &json!([{
            "date": "2025-12-09",
            "title": "T",
            "media_type": "image",
            "url": "https://x/img.jpg"
        }]),
    )?;

    let summary = transform::run(&config)?;
    assert_eq!(summary.rows_written, 1);

    let csv = fs::read_to_string(config.staged_artifact_path())?;
    assert_eq!(
        csv,
        "date,title,explanation,media_type,image_url\n2025-12-09,T,,image,https://x/img.jpg\n"
    );
    Ok(())
}

#[test]
fn missing_raw_artifact_is_a_missing_input() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = transform::run(&config);
    assert!(matches!(result, Err(PipelineError::MissingInput(_))));
}
