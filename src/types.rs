use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kind of an APOD entry. Anything the API sends that is not a known
/// kind is treated as an image, matching the source's own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MediaType {
    Video,
    #[default]
    Image,
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "video" => MediaType::Video,
            _ => MediaType::Image,
        }
    }
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One APOD entry as returned by the API. Optional fields come and go per
/// entry; `thumbnail_url` only appears for videos when thumbnails were
/// requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawApodRecord {
    pub date: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hdurl: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub service_version: Option<String>,
}

/// The APOD endpoint returns a bare object for a single-day window and an
/// array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApodResponse {
    Many(Vec<RawApodRecord>),
    One(Box<RawApodRecord>),
}

impl ApodResponse {
    pub fn into_records(self) -> Vec<RawApodRecord> {
        match self {
            ApodResponse::Many(records) => records,
            ApodResponse::One(record) => vec![*record],
        }
    }
}

/// One row of the staged tabular artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRow {
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub media_type: MediaType,
    pub image_url: String,
}
