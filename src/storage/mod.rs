pub mod json;
pub mod migrate;
pub mod sqlite;

pub use json::*;
pub use migrate::*;
pub use sqlite::*;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{StorageBackend, StorageSettings};
use crate::feedback::FeedbackRecord;
use crate::shoe::{EventLog, LogEntry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("failed to read {what}: {reason}")]
    Read { what: String, reason: String },
    #[error("failed to write {what}: {reason}")]
    Write { what: String, reason: String },
}

impl StorageError {
    pub fn read(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Durable home of the event log and the feedback records. Both are
/// append-only: implementations never rewrite entries already stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn load_log(&self) -> Result<EventLog, StorageError>;
    async fn append_to_log(&self, entries: &[LogEntry]) -> Result<(), StorageError>;
    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>, StorageError>;
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError>;
}

pub async fn open_store(settings: &StorageSettings) -> anyhow::Result<Arc<dyn EventStore>> {
    match settings.backend {
        StorageBackend::Json => {
            info!("Using JSON file storage in {}", settings.data_dir.display());
            let store = JsonFileStore::new(&settings.data_dir).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Sqlite => {
            info!("Using SQLite storage at {}", settings.sqlite_url);
            let store = SqliteStore::new(&settings.sqlite_url).await?;
            Ok(Arc::new(store))
        }
    }
}
