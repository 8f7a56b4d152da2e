use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

use super::{EventStore, StorageError};
use crate::feedback::FeedbackRecord;
use crate::shoe::{EventLog, LogEntry};

/// Log entries and feedback records as JSON payload rows, ordered by an
/// autoincrement sequence.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_url: &str) -> Result<Self, StorageError> {
        info!("Initializing SQLite storage at: {}", db_url);

        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| StorageError::read(db_url, e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::read(db_url, e))?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StorageError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS log_entries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                shoe_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_log_entries_shoe ON log_entries(shoe_id)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                was_correct INTEGER NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::write("schema", e))?;
        }
        Ok(())
    }
}

fn entry_kind(entry: &LogEntry) -> &'static str {
    match entry {
        LogEntry::Round(_) => "round",
        LogEntry::Event(_) => "event",
    }
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn load_log(&self) -> Result<EventLog, StorageError> {
        let rows = sqlx::query("SELECT payload FROM log_entries ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::read("log_entries", e))?;

        let entries = rows
            .iter()
            .map(|row| {
                let payload: String = row.get("payload");
                serde_json::from_str(&payload).map_err(|e| StorageError::read("log_entries", e))
            })
            .collect::<Result<Vec<LogEntry>, _>>()?;

        Ok(EventLog::from_entries(entries))
    }

    async fn append_to_log(&self, entries: &[LogEntry]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write("log_entries", e))?;

        for entry in entries {
            let payload = serde_json::to_string(entry).map_err(|e| StorageError::write("log_entries", e))?;
            sqlx::query("INSERT INTO log_entries (shoe_id, kind, payload) VALUES (?, ?, ?)")
                .bind(entry.shoe_id().as_str())
                .bind(entry_kind(entry))
                .bind(payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::write("log_entries", e))?;
        }

        tx.commit().await.map_err(|e| StorageError::write("log_entries", e))
    }

    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>, StorageError> {
        let rows = sqlx::query("SELECT payload FROM feedback ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::read("feedback", e))?;

        rows.iter()
            .map(|row| {
                let payload: String = row.get("payload");
                serde_json::from_str(&payload).map_err(|e| StorageError::read("feedback", e))
            })
            .collect()
    }

    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError> {
        let payload = serde_json::to_string(record).map_err(|e| StorageError::write("feedback", e))?;
        sqlx::query("INSERT INTO feedback (id, timestamp, was_correct, payload) VALUES (?, ?, ?, ?)")
            .bind(record.id.to_string())
            .bind(record.timestamp.to_string())
            .bind(record.was_correct)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::write("feedback", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::PredictionSnapshot;
    use crate::types::{HandPair, Outcome};

    async fn temp_store() -> SqliteStore {
        let path = std::env::temp_dir().join(format!("baccarat-{}.db", uuid::Uuid::new_v4()));
        SqliteStore::new(&format!("sqlite:{}", path.display())).await.unwrap()
    }

    #[tokio::test]
    async fn test_log_round_trip_keeps_order() {
        let store = temp_store().await;
        let mut log = EventLog::new();
        log.start_shoe();
        log.record_round(HandPair::parse("9-K", "2-3").unwrap(), Outcome::Player)
            .unwrap();
        log.record_round(HandPair::parse("A-2", "3-4").unwrap(), Outcome::Banker)
            .unwrap();
        store.append_to_log(log.entries()).await.unwrap();

        let loaded = store.load_log().await.unwrap();
        assert_eq!(loaded.entries(), log.entries());
        assert_eq!(loaded.current_shoe_rounds().len(), 2);
    }

    #[tokio::test]
    async fn test_feedback_round_trip() {
        let store = temp_store().await;
        let record = FeedbackRecord::new(
            PredictionSnapshot::new(Outcome::Player, vec![Outcome::Player, Outcome::Banker]),
            Outcome::Player,
        );
        store.append_feedback(&record).await.unwrap();

        let loaded = store.load_feedback().await.unwrap();
        assert_eq!(loaded, vec![record]);
    }
}
