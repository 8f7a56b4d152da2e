use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{EventStore, StorageError};
use crate::feedback::FeedbackRecord;
use crate::shoe::{EventLog, LogEntry};

pub const GAME_DATA_FILE: &str = "game_data.json";
pub const FEEDBACK_DATA_FILE: &str = "feedback_data.json";

/// Two pretty-printed JSON arrays in a data directory, compatible with
/// files written by earlier versions of the tool.
pub struct JsonFileStore {
    game_path: PathBuf,
    feedback_path: PathBuf,
}

impl JsonFileStore {
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .await
            .map_err(|e| StorageError::write(data_dir.display().to_string(), e))?;

        Ok(Self {
            game_path: data_dir.join(GAME_DATA_FILE),
            feedback_path: data_dir.join(FEEDBACK_DATA_FILE),
        })
    }

    pub fn game_path(&self) -> &Path {
        &self.game_path
    }
}

/// A missing or blank file is an empty array
pub(crate) async fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let what = path.display().to_string();
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::read(what, e)),
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|e| StorageError::read(what, e))
}

/// Replace `path` through a sibling temp file so readers never see a torn write
pub(crate) async fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StorageError> {
    let what = path.display().to_string();
    let body = serde_json::to_string_pretty(items).map_err(|e| StorageError::write(&what, e))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut file = fs::File::create(&tmp).await.map_err(|e| StorageError::write(&what, e))?;
        file.write_all(body.as_bytes())
            .await
            .map_err(|e| StorageError::write(&what, e))?;
        file.sync_all().await.map_err(|e| StorageError::write(&what, e))?;
    }
    fs::rename(&tmp, path).await.map_err(|e| StorageError::write(&what, e))?;

    // the rename is only durable once the directory entry is synced
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent).await {
            let _ = dir.sync_all().await;
        }
    }
    debug!("Wrote {} items to {}", items.len(), what);
    Ok(())
}

#[async_trait]
impl EventStore for JsonFileStore {
    async fn load_log(&self) -> Result<EventLog, StorageError> {
        let entries: Vec<LogEntry> = read_array(&self.game_path).await?;
        Ok(EventLog::from_entries(entries))
    }

    async fn append_to_log(&self, entries: &[LogEntry]) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut stored: Vec<LogEntry> = read_array(&self.game_path).await?;
        stored.extend_from_slice(entries);
        write_array(&self.game_path, &stored).await
    }

    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>, StorageError> {
        read_array(&self.feedback_path).await
    }

    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError> {
        let mut stored: Vec<FeedbackRecord> = read_array(&self.feedback_path).await?;
        stored.push(record.clone());
        write_array(&self.feedback_path, &stored).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::PredictionSnapshot;
    use crate::shoe::{ShoeEvent, ShoeId};
    use crate::types::{HandPair, Outcome};
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("baccarat-store-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await.unwrap();
        assert!(store.load_log().await.unwrap().is_empty());
        assert!(store.load_feedback().await.unwrap().is_empty());

        fs::write(store.game_path(), "  \n").await.unwrap();
        assert!(store.load_log().await.unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_appends_accumulate() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await.unwrap();

        let mut log = store.load_log().await.unwrap();
        let mark = log.len();
        log.start_shoe();
        log.record_round(HandPair::parse("9-K", "2-3").unwrap(), Outcome::Player)
            .unwrap();
        store.append_to_log(log.entries_since(mark)).await.unwrap();

        store
            .append_to_log(&[LogEntry::Event(ShoeEvent::end(ShoeId::from_number(1)))])
            .await
            .unwrap();

        let reloaded = store.load_log().await.unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.all_outcomes(), vec![Outcome::Player]);
        assert!(!reloaded.shoe_state().is_active);
        assert_eq!(reloaded.next_shoe_id(), ShoeId::from_number(2));

        let record = FeedbackRecord::new(PredictionSnapshot::new(Outcome::Banker, vec![Outcome::Player]), Outcome::Banker);
        store.append_feedback(&record).await.unwrap();
        store.append_feedback(&record).await.unwrap();
        assert_eq!(store.load_feedback().await.unwrap().len(), 2);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_write_replaces_file_and_leaves_no_temp() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join(GAME_DATA_FILE);

        write_array(&path, &[1, 2, 3]).await.unwrap();
        write_array(&path, &[4]).await.unwrap();

        let stored: Vec<i32> = read_array(&path).await.unwrap();
        assert_eq!(stored, vec![4]);
        assert!(fs::metadata(dir.join(format!("{}.tmp", GAME_DATA_FILE))).await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_unparseable_stored_hand_is_a_read_error() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await.unwrap();
        let stored = r#"[
            {"event": "SHOE_START", "shoe_id": "shoe_1"},
            {"player_hand": "9-Z", "banker_hand": "2-3", "outcome": "Player", "shoe_id": "shoe_1", "round": 1}
        ]"#;
        fs::write(store.game_path(), stored).await.unwrap();

        assert!(matches!(store.load_log().await, Err(StorageError::Read { .. })));
        let shoe_start = LogEntry::Event(ShoeEvent::start(ShoeId::from_number(2)));
        assert!(store.append_to_log(&[shoe_start]).await.is_err());
        assert_eq!(fs::read_to_string(store.game_path()).await.unwrap(), stored);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_read_error() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await.unwrap();
        fs::write(store.game_path(), "{not json").await.unwrap();
        assert!(matches!(store.load_log().await, Err(StorageError::Read { .. })));
        let _ = fs::remove_dir_all(&dir).await;
    }
}
