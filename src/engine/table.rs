use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

use super::{PredictionReport, TableError};
use crate::config::RuntimeConfigManager;
use crate::feedback::{FeedbackRecord, PredictionSnapshot};
use crate::predictor::{combine, EnsemblePredictor, PredictionContext, Predictor, SequentialPredictor};
use crate::shoe::{Round, ShoeError, ShoeId, ShoeStart};
use crate::storage::EventStore;
use crate::types::{HandPair, Outcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub shoe_id: Option<ShoeId>,
    pub is_active: bool,
    pub current_shoe_rounds: usize,
    pub past_shoes: usize,
    pub total_rounds: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum TableEvent {
    Status(TableStatus),
    ShoeStarted { shoe_id: ShoeId, ended: Option<ShoeId> },
    ShoeEnded { shoe_id: ShoeId },
    RoundRecorded(Round),
    FeedbackRecorded { actual_outcome: Outcome, was_correct: bool },
}

/// The single writer in front of the event store. Log mutations hold the
/// write guard across load, derive and append; reads hold it only while
/// loading.
pub struct GameTable {
    store: Arc<dyn EventStore>,
    config: RuntimeConfigManager,
    log_guard: RwLock<()>,
    feedback_guard: Mutex<()>,
    event_tx: broadcast::Sender<TableEvent>,
}

impl GameTable {
    pub fn new(store: Arc<dyn EventStore>, config: RuntimeConfigManager) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            store,
            config,
            log_guard: RwLock::new(()),
            feedback_guard: Mutex::new(()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &RuntimeConfigManager {
        &self.config
    }

    pub async fn start_shoe(&self) -> Result<ShoeStart, TableError> {
        let _guard = self.log_guard.write().await;
        let mut log = self.store.load_log().await?;
        let mark = log.len();

        let start = log.start_shoe();
        self.store.append_to_log(log.entries_since(mark)).await?;

        let _ = self.event_tx.send(TableEvent::ShoeStarted {
            shoe_id: start.started.clone(),
            ended: start.ended.clone(),
        });
        Ok(start)
    }

    /// Validates the hands against the claimed outcome before touching the log
    pub async fn record_round(&self, player_hand: &str, banker_hand: &str, outcome: Outcome) -> Result<Round, TableError> {
        let hands = HandPair::parse(player_hand, banker_hand).map_err(ShoeError::from)?;
        let computed = hands.outcome();
        if computed != outcome {
            return Err(ShoeError::OutcomeMismatch {
                claimed: outcome,
                computed,
            }
            .into());
        }

        let _guard = self.log_guard.write().await;
        let mut log = self.store.load_log().await?;
        let mark = log.len();

        let round = log.record_round(hands, outcome)?;
        self.store.append_to_log(log.entries_since(mark)).await?;

        info!("Game added to {}, round {}", round.shoe_id, round.round_index);
        let _ = self.event_tx.send(TableEvent::RoundRecorded(round.clone()));
        Ok(round)
    }

    pub async fn end_shoe(&self) -> Result<ShoeId, TableError> {
        let _guard = self.log_guard.write().await;
        let mut log = self.store.load_log().await?;
        let mark = log.len();

        let shoe_id = log.end_shoe()?;
        self.store.append_to_log(log.entries_since(mark)).await?;

        let _ = self.event_tx.send(TableEvent::ShoeEnded {
            shoe_id: shoe_id.clone(),
        });
        Ok(shoe_id)
    }

    pub async fn predict(&self, sequence: &[Outcome]) -> Result<PredictionReport, TableError> {
        if sequence.is_empty() {
            return Err(TableError::EmptySequence);
        }

        let log = {
            let _guard = self.log_guard.read().await;
            self.store.load_log().await?
        };
        let feedback = self.load_feedback_lenient().await;
        let engine = self.config.engine().await;

        let history = log.all_outcomes();
        let state = log.shoe_state();
        let past_shoes = log.past_shoes(state.active_shoe());
        let ctx = PredictionContext::new(sequence)
            .with_history(&history)
            .with_past_shoes(&past_shoes)
            .with_feedback(&feedback);

        let ensemble = EnsemblePredictor::from_config(&engine);
        let components = ensemble.run(&ctx);
        let weighted = combine(&components);
        let sequential = match components.iter().find(|c| c.name == "sequential") {
            Some(component) => component.result.clone(),
            None => SequentialPredictor::new(engine.sequential.clone()).predict(&ctx),
        };

        Ok(PredictionReport::new(&components, &sequential, &weighted))
    }

    /// Feedback problems never fail a prediction
    async fn load_feedback_lenient(&self) -> Vec<FeedbackRecord> {
        let _guard = self.feedback_guard.lock().await;
        match self.store.load_feedback().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Ignoring feedback for this prediction: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn record_feedback(&self, snapshot: PredictionSnapshot, actual_outcome: Outcome) -> Result<FeedbackRecord, TableError> {
        let record = FeedbackRecord::new(snapshot, actual_outcome);
        {
            let _guard = self.feedback_guard.lock().await;
            self.store.append_feedback(&record).await?;
        }

        let _ = self.event_tx.send(TableEvent::FeedbackRecorded {
            actual_outcome,
            was_correct: record.was_correct,
        });
        Ok(record)
    }

    pub async fn status(&self) -> Result<TableStatus, TableError> {
        let log = {
            let _guard = self.log_guard.read().await;
            self.store.load_log().await?
        };
        let state = log.shoe_state();

        Ok(TableStatus {
            current_shoe_rounds: log.current_shoe_rounds().len(),
            past_shoes: log.past_shoes(state.active_shoe()).len(),
            total_rounds: log.rounds().count(),
            is_active: state.is_active,
            shoe_id: state.shoe_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::shoe::EventLog;
    use crate::storage::{JsonFileStore, MockEventStore, StorageError};
    use crate::types::Outcome::{Banker as B, Player as P, Tie as T};

    fn table_with(store: MockEventStore) -> GameTable {
        GameTable::new(Arc::new(store), RuntimeConfigManager::new(RuntimeConfig::default()))
    }

    fn active_log() -> EventLog {
        let mut log = EventLog::new();
        log.start_shoe();
        log
    }

    #[tokio::test]
    async fn test_failed_append_publishes_nothing() {
        let mut store = MockEventStore::new();
        store.expect_load_log().returning(|| Ok(active_log()));
        store
            .expect_append_to_log()
            .times(1)
            .returning(|_| Err(StorageError::write("game_data.json", "disk full")));

        let table = table_with(store);
        let mut events = table.subscribe();
        let result = table.record_round("9-K", "2-3", P).await;

        assert!(matches!(result, Err(TableError::Storage(StorageError::Write { .. }))));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_active_shoe_never_appends() {
        let mut store = MockEventStore::new();
        store.expect_load_log().returning(|| Ok(EventLog::new()));
        store.expect_append_to_log().times(0);

        let table = table_with(store);
        let result = table.record_round("9-K", "2-3", P).await;
        assert!(matches!(result, Err(TableError::Shoe(ShoeError::NoActiveShoe))));
        assert!(matches!(
            table.end_shoe().await,
            Err(TableError::Shoe(ShoeError::NoActiveShoeToEnd))
        ));
    }

    #[tokio::test]
    async fn test_invalid_rounds_never_touch_the_store() {
        let mut store = MockEventStore::new();
        store.expect_load_log().times(0);

        let table = table_with(store);
        assert!(matches!(
            table.record_round("9-K", "2-3", B).await,
            Err(TableError::Shoe(ShoeError::OutcomeMismatch { claimed: B, computed: P }))
        ));
        assert!(matches!(
            table.record_round("9-X", "2-3", P).await,
            Err(TableError::Shoe(ShoeError::InvalidHand(_)))
        ));
    }

    #[tokio::test]
    async fn test_broken_feedback_does_not_fail_prediction() {
        let mut store = MockEventStore::new();
        store.expect_load_log().returning(|| Ok(active_log()));
        store
            .expect_load_feedback()
            .returning(|| Err(StorageError::read("feedback_data.json", "corrupt")));

        let table = table_with(store);
        let report = table.predict(&[P, B, P, B, P]).await.unwrap();
        assert!(!report.current_shoe_prediction.is_error());
        assert!(!report.sequential_prediction.is_error());
    }

    #[tokio::test]
    async fn test_unreadable_log_fails_prediction() {
        let mut store = MockEventStore::new();
        store
            .expect_load_log()
            .returning(|| Err(StorageError::read("game_data.json", "corrupt")));

        let table = table_with(store);
        assert!(matches!(table.predict(&[P]).await, Err(TableError::Storage(_))));
        assert!(matches!(table.predict(&[]).await, Err(TableError::EmptySequence)));
    }

    #[test]
    fn test_status_event_wire_shape() {
        let event = TableEvent::Status(TableStatus {
            shoe_id: Some(ShoeId::from_number(3)),
            is_active: true,
            current_shoe_rounds: 4,
            past_shoes: 2,
            total_rounds: 170,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Status");
        assert_eq!(value["data"]["shoe_id"], "shoe_3");
        assert_eq!(value["data"]["is_active"], true);
        assert_eq!(value["data"]["current_shoe_rounds"], 4);
    }

    #[test]
    fn test_shoe_lifecycle_against_json_store() {
        tokio_test::block_on(async {
            let dir = std::env::temp_dir().join(format!("baccarat-table-{}", uuid::Uuid::new_v4()));
            let store = JsonFileStore::new(&dir).await.unwrap();
            let table = GameTable::new(Arc::new(store), RuntimeConfigManager::new(RuntimeConfig::default()));
            let mut events = table.subscribe();

            let first = table.start_shoe().await.unwrap();
            assert_eq!(first.started, ShoeId::from_number(1));
            assert_eq!(first.ended, None);

            table.record_round("9-K", "2-3", P).await.unwrap();
            let round = table.record_round("A-2", "3-4", B).await.unwrap();
            assert_eq!(round.round_index, 2);

            let second = table.start_shoe().await.unwrap();
            assert_eq!(second.ended, Some(ShoeId::from_number(1)));
            let round = table.record_round("5-5", "10-K", T).await.unwrap();
            assert_eq!(round.round_index, 1);

            let status = table.status().await.unwrap();
            assert_eq!(status.shoe_id, Some(ShoeId::from_number(2)));
            assert!(status.is_active);
            assert_eq!(status.current_shoe_rounds, 1);
            assert_eq!(status.past_shoes, 1);
            assert_eq!(status.total_rounds, 3);

            assert_eq!(table.end_shoe().await.unwrap(), ShoeId::from_number(2));
            assert!(!table.status().await.unwrap().is_active);

            let record = table
                .record_feedback(PredictionSnapshot::new(P, vec![P, B]), B)
                .await
                .unwrap();
            assert!(!record.was_correct);

            assert!(matches!(events.try_recv(), Ok(TableEvent::ShoeStarted { .. })));
            let _ = tokio::fs::remove_dir_all(&dir).await;
        });
    }
}
