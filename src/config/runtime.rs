use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub storage: StorageSettings,
    pub server: ServerSettings,
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = self.engine.validate().err().unwrap_or_default();

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.sqlite_url.is_empty() {
            errors.push("storage.sqlite_url is required for the sqlite backend".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Thresholds and minimum-length guards of every predictor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub historical: HistoricalSettings,
    pub current_shoe: CurrentShoeSettings,
    pub best_fit: BestFitSettings,
    pub sequential: SequentialSettings,
    pub feedback: FeedbackSettings,
    pub ensemble: EnsembleSettings,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let ratios = [
            ("historical.similarity_threshold", self.historical.similarity_threshold),
            ("current_shoe.long_pattern_threshold", self.current_shoe.long_pattern_threshold),
            ("current_shoe.short_pattern_threshold", self.current_shoe.short_pattern_threshold),
            ("best_fit.min_similarity", self.best_fit.min_similarity),
            ("feedback.min_similarity", self.feedback.min_similarity),
            ("feedback.accuracy_floor", self.feedback.accuracy_floor),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{} must be between 0 and 1", name));
            }
        }

        if self.historical.streak_length < 2 {
            errors.push("historical.streak_length must be >= 2".to_string());
        }
        if self.current_shoe.min_pattern_len == 0 {
            errors.push("current_shoe.min_pattern_len must be > 0".to_string());
        }
        if self.current_shoe.min_pattern_len > self.current_shoe.max_pattern_len {
            errors.push("current_shoe: min_pattern_len must be <= max_pattern_len".to_string());
        }
        if self.current_shoe.min_rounds == 0 {
            errors.push("current_shoe.min_rounds must be > 0".to_string());
        }
        if self.best_fit.min_rounds == 0 {
            errors.push("best_fit.min_rounds must be > 0".to_string());
        }
        if self.sequential.min_rounds < 2 {
            errors.push("sequential.min_rounds must be >= 2".to_string());
        }
        if self.feedback.min_records == 0 {
            errors.push("feedback.min_records must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalSettings {
    pub similarity_threshold: f64,
    pub streak_length: usize,
    /// A streak verdict needs strictly more observed events than this
    pub min_streak_events: usize,
}

impl Default for HistoricalSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            streak_length: 3,
            min_streak_events: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentShoeSettings {
    pub min_rounds: usize,
    pub max_pattern_len: usize,
    pub min_pattern_len: usize,
    /// Patterns longer than this use `long_pattern_threshold`
    pub long_pattern_above: usize,
    pub long_pattern_threshold: f64,
    pub short_pattern_threshold: f64,
}

impl CurrentShoeSettings {
    pub fn threshold_for(&self, pattern_len: usize) -> f64 {
        if pattern_len > self.long_pattern_above {
            self.long_pattern_threshold
        } else {
            self.short_pattern_threshold
        }
    }
}

impl Default for CurrentShoeSettings {
    fn default() -> Self {
        Self {
            min_rounds: 5,
            max_pattern_len: 7,
            min_pattern_len: 3,
            long_pattern_above: 4,
            long_pattern_threshold: 0.9,
            short_pattern_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestFitSettings {
    pub min_rounds: usize,
    pub min_similarity: f64,
}

impl Default for BestFitSettings {
    fn default() -> Self {
        Self {
            min_rounds: 5,
            min_similarity: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequentialSettings {
    pub min_rounds: usize,
}

impl Default for SequentialSettings {
    fn default() -> Self {
        Self { min_rounds: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    pub min_sequence_len: usize,
    pub min_similarity: f64,
    pub min_records: usize,
    /// Confidence is only scaled down when accuracy falls below this
    pub accuracy_floor: f64,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            min_sequence_len: 5,
            min_similarity: 0.8,
            min_records: 3,
            accuracy_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSettings {
    /// Let the sequential-transition predictor vote as well
    pub include_sequential: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub sqlite_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: PathBuf::from("data"),
            sqlite_url: "sqlite:./data/baccarat.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
