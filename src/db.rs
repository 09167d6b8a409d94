use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use libsql::{Builder, Connection, Database, Value};
use std::env;
use tracing::info;

use crate::constants::{LIBSQL_AUTH_TOKEN_ENV, LIBSQL_URL_ENV};
use crate::error::{PipelineError, Result};
use crate::storage::{blank_to_null, ApodStorage, PersistedApod};
use crate::types::StagedRow;

pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Create a new database manager with connection to Turso
    pub async fn new() -> Result<Self> {
        let url = env::var(LIBSQL_URL_ENV).map_err(|_| PipelineError::Database {
            message: format!("{LIBSQL_URL_ENV} environment variable not set"),
        })?;

        let auth_token = env::var(LIBSQL_AUTH_TOKEN_ENV).map_err(|_| PipelineError::Database {
            message: format!("{LIBSQL_AUTH_TOKEN_ENV} environment variable not set"),
        })?;

        info!("Connecting to destination database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| PipelineError::Database {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| PipelineError::Database {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    /// Apply the destination table DDL
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;
        let migration_sql = include_str!("../migrations/001_create_nasa_apod.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| PipelineError::Database {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// libSQL-backed destination store.
pub struct DatabaseStorage {
    manager: DatabaseManager,
}

impl DatabaseStorage {
    pub fn new(manager: DatabaseManager) -> Self {
        Self { manager }
    }
}

fn text_or_null(value: &str) -> Value {
    match blank_to_null(value) {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

fn column_value(row: &libsql::Row, index: i32) -> Result<Value> {
    row.get_value(index).map_err(|e| PipelineError::Database {
        message: format!("Failed to read column {index}: {e}"),
    })
}

fn optional_text(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| PipelineError::Database {
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn row_from_columns(row: &libsql::Row) -> Result<PersistedApod> {
    let id = match column_value(row, 0)? {
        Value::Integer(v) => v,
        other => {
            return Err(PipelineError::Database {
                message: format!("unexpected id column value: {other:?}"),
            })
        }
    };

    let date_text = optional_text(column_value(row, 1)?).ok_or_else(|| PipelineError::Database {
        message: "date column is not text".to_string(),
    })?;
    let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|e| {
        PipelineError::Database {
            message: format!("bad date '{date_text}': {e}"),
        }
    })?;

    let created_raw =
        optional_text(column_value(row, 6)?).ok_or_else(|| PipelineError::Database {
            message: "created_at column is not text".to_string(),
        })?;
    let updated_raw =
        optional_text(column_value(row, 7)?).ok_or_else(|| PipelineError::Database {
            message: "updated_at column is not text".to_string(),
        })?;

    Ok(PersistedApod {
        id,
        date,
        title: optional_text(column_value(row, 2)?),
        explanation: optional_text(column_value(row, 3)?),
        media_type: optional_text(column_value(row, 4)?).unwrap_or_default(),
        image_url: optional_text(column_value(row, 5)?),
        created_at: parse_timestamp(&created_raw)?,
        updated_at: parse_timestamp(&updated_raw)?,
    })
}

#[async_trait]
impl ApodStorage for DatabaseStorage {
    async fn upsert_batch(&self, rows: &[StagedRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let conn = self.manager.get_connection().await?;

        // One multi-row statement per batch; conflict on the date key
        // overwrites the mutable columns and refreshes updated_at only.
        let placeholders = vec!["(?, ?, ?, ?, ?)"; rows.len()].join(", ");
        let sql = format!(
            "INSERT INTO nasa_apod (date, title, explanation, media_type, image_url) \
             VALUES {placeholders} \
             ON CONFLICT(date) DO UPDATE SET \
             title = excluded.title, \
             explanation = excluded.explanation, \
             media_type = excluded.media_type, \
             image_url = excluded.image_url, \
             updated_at = datetime('now')"
        );

        let mut params: Vec<Value> = Vec::with_capacity(rows.len() * 5);
        for row in rows {
            params.push(Value::Text(row.date.to_string()));
            params.push(text_or_null(&row.title));
            params.push(text_or_null(&row.explanation));
            params.push(Value::Text(row.media_type.as_str().to_string()));
            params.push(text_or_null(&row.image_url));
        }

        conn.execute(&sql, params)
            .await
            .map_err(|e| PipelineError::Database {
                message: format!("Failed to upsert batch: {e}"),
            })?;

        Ok(())
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<PersistedApod>> {
        let conn = self.manager.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, date, title, explanation, media_type, image_url, created_at, updated_at \
                 FROM nasa_apod WHERE date = ?",
                libsql::params![date.to_string()],
            )
            .await
            .map_err(|e| PipelineError::Database {
                message: format!("Failed to query row: {e}"),
            })?;

        match rows.next().await.map_err(|e| PipelineError::Database {
            message: format!("Failed to read row: {e}"),
        })? {
            Some(row) => Ok(Some(row_from_columns(&row)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.manager.get_connection().await?;

        let mut rows = conn
            .query("SELECT COUNT(*) FROM nasa_apod", ())
            .await
            .map_err(|e| PipelineError::Database {
                message: format!("Failed to count rows: {e}"),
            })?;

        match rows.next().await.map_err(|e| PipelineError::Database {
            message: format!("Failed to read count: {e}"),
        })? {
            Some(row) => match column_value(&row, 0)? {
                Value::Integer(v) => Ok(v as u64),
                other => Err(PipelineError::Database {
                    message: format!("unexpected count value: {other:?}"),
                }),
            },
            None => Ok(0),
        }
    }
}
