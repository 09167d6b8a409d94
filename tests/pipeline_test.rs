use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

use apod_pipeline::config::Config;
use apod_pipeline::pipeline::{load, transform};
use apod_pipeline::storage::{ApodStorage, InMemoryStorage};

#[tokio::test]
async fn raw_artifact_flows_through_transform_and_load() -> Result<()> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.data.dir = dir.path().to_path_buf();
    config.load.batch_delay_ms = 0;

    // A window's worth of raw records: an image, a video with a thumbnail,
    // and one record with a broken date.
    let raw = json!([
        {
            "date": "2025-12-07",
            "title": "Spiral Galaxy",
            "explanation": "A nearby spiral galaxy.",
            "media_type": "image",
            "url": "https://example.com/galaxy.jpg",
            "hdurl": "https://example.com/galaxy_hd.jpg",
            "service_version": "v1"
        },
        {
            "date": "2025-12-08",
            "title": "Aurora Timelapse",
            "media_type": "video",
            "url": "https://youtube.com/watch?v=xyz",
            "thumbnail_url": "https://img.youtube.com/vi/xyz/0.jpg",
            "service_version": "v1"
        },
        {
            "date": "December 9th",
            "title": "Broken Entry",
            "media_type": "image",
            "url": "https://example.com/broken.jpg"
        }
    ]);

    let raw_path = config.raw_artifact_path();
    fs::create_dir_all(raw_path.parent().unwrap())?;
    fs::write(&raw_path, serde_json::to_vec(&raw)?)?;

    let transform_summary = transform::run(&config)?;
    assert_eq!(transform_summary.records_read, 3);
    assert_eq!(transform_summary.rows_written, 2);
    assert_eq!(transform_summary.rows_dropped, 1);

    let storage = Arc::new(InMemoryStorage::new());
    let load_summary = load::run(&config, storage.clone(), false).await?;
    assert_eq!(load_summary.rows_upserted, 2);
    assert_eq!(storage.count().await?, 2);

    let image_row = storage
        .get_by_date(NaiveDate::from_ymd_opt(2025, 12, 7).unwrap())
        .await?
        .unwrap();
    assert_eq!(image_row.title.as_deref(), Some("Spiral Galaxy"));
    assert_eq!(
        image_row.image_url.as_deref(),
        Some("https://example.com/galaxy.jpg")
    );
    assert_eq!(image_row.media_type, "image");

    let video_row = storage
        .get_by_date(NaiveDate::from_ymd_opt(2025, 12, 8).unwrap())
        .await?
        .unwrap();
    assert_eq!(
        video_row.image_url.as_deref(),
        Some("https://img.youtube.com/vi/xyz/0.jpg")
    );
    // Missing explanation is staged as an empty string, then stored as NULL.
    assert_eq!(video_row.explanation, None);
    Ok(())
}
