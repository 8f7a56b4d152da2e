use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use super::runtime::{EngineConfig, RuntimeConfig};

#[derive(Debug, Clone, Serialize)]
pub enum ConfigChangeEvent {
    EngineUpdated(EngineConfig),
}

pub struct RuntimeConfigManager {
    config: Arc<RwLock<RuntimeConfig>>,
    change_tx: broadcast::Sender<ConfigChangeEvent>,
}

impl RuntimeConfigManager {
    pub fn new(initial: RuntimeConfig) -> Self {
        let (change_tx, _) = broadcast::channel(32);
        Self {
            config: Arc::new(RwLock::new(initial)),
            change_tx,
        }
    }

    pub async fn get_config(&self) -> RuntimeConfig {
        self.config.read().await.clone()
    }

    pub async fn engine(&self) -> EngineConfig {
        self.config.read().await.engine.clone()
    }

    pub async fn update_engine(&self, settings: EngineConfig) -> Result<(), String> {
        let mut config = self.config.write().await;
        let old_engine = config.engine.clone();
        config.engine = settings.clone();

        if let Err(errors) = config.validate() {
            config.engine = old_engine;
            return Err(errors.join(", "));
        }

        info!(
            "Engine settings updated: history_threshold={}, best_fit_min={}, sequential_votes={}",
            settings.historical.similarity_threshold,
            settings.best_fit.min_similarity,
            settings.ensemble.include_sequential
        );
        let _ = self.change_tx.send(ConfigChangeEvent::EngineUpdated(settings));
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.change_tx.subscribe()
    }
}

impl Clone for RuntimeConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            change_tx: self.change_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_engine_update_rolls_back() {
        let manager = RuntimeConfigManager::new(RuntimeConfig::default());

        let mut bad = EngineConfig::default();
        bad.best_fit.min_similarity = 2.0;
        assert!(manager.update_engine(bad).await.is_err());
        assert_eq!(manager.engine().await, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_engine_update_is_broadcast() {
        let manager = RuntimeConfigManager::new(RuntimeConfig::default());
        let mut rx = manager.subscribe();

        let mut settings = EngineConfig::default();
        settings.ensemble.include_sequential = true;
        manager.update_engine(settings.clone()).await.unwrap();

        assert_eq!(manager.engine().await, settings);
        let ConfigChangeEvent::EngineUpdated(updated) = rx.recv().await.unwrap();
        assert!(updated.ensemble.include_sequential);
    }
}
