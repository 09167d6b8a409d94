use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::types::StagedRow;

/// Row shape as it exists in the destination table.
#[derive(Debug, Clone)]
pub struct PersistedApod {
    pub id: i64,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub explanation: Option<String>,
    pub media_type: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Empty strings in the staged artifact stand for missing data; the
/// destination stores them as NULL.
pub fn blank_to_null(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Destination store for staged rows, keyed on the calendar date.
#[async_trait]
pub trait ApodStorage: Send + Sync {
    /// Insert-or-update every row in the batch. An existing row keeps its id
    /// and created_at; its mutable columns are overwritten and updated_at is
    /// refreshed.
    async fn upsert_batch(&self, rows: &[StagedRow]) -> Result<()>;

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<PersistedApod>>;

    async fn count(&self) -> Result<u64>;
}

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    inner: Mutex<Inner>,
}

struct Inner {
    rows: HashMap<NaiveDate, PersistedApod>,
    next_id: i64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApodStorage for InMemoryStorage {
    async fn upsert_batch(&self, rows: &[StagedRow]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let Inner { rows: stored, next_id } = &mut *inner;
        let now = Utc::now();

        for row in rows {
            match stored.entry(row.date) {
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    existing.title = blank_to_null(&row.title).map(str::to_string);
                    existing.explanation = blank_to_null(&row.explanation).map(str::to_string);
                    existing.media_type = row.media_type.as_str().to_string();
                    existing.image_url = blank_to_null(&row.image_url).map(str::to_string);
                    existing.updated_at = now;
                    debug!("Updated row for {}", row.date);
                }
                Entry::Vacant(slot) => {
                    let id = *next_id;
                    *next_id += 1;
                    slot.insert(PersistedApod {
                        id,
                        date: row.date,
                        title: blank_to_null(&row.title).map(str::to_string),
                        explanation: blank_to_null(&row.explanation).map(str::to_string),
                        media_type: row.media_type.as_str().to_string(),
                        image_url: blank_to_null(&row.image_url).map(str::to_string),
                        created_at: now,
                        updated_at: now,
                    });
                    debug!("Inserted row for {} with id {}", row.date, id);
                }
            }
        }
        Ok(())
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<PersistedApod>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.get(&date).cloned())
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.len() as u64)
    }
}
