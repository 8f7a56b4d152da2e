use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::predictor::similarity;
use crate::types::Outcome;

/// What the client saw when it made its bet. Only the called side and the
/// input sequence are interpreted; anything else is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Outcome>,
    #[serde(default)]
    pub user_sequence: Vec<Outcome>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictionSnapshot {
    pub fn new(prediction: Outcome, user_sequence: Vec<Outcome>) -> Self {
        Self {
            prediction: Some(prediction),
            user_sequence,
            extra: Map::new(),
        }
    }
}

/// One observation of whether a served prediction came true. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub prediction_data: PredictionSnapshot,
    pub actual_outcome: Outcome,
    pub was_correct: bool,
}

impl FeedbackRecord {
    pub fn new(prediction_data: PredictionSnapshot, actual_outcome: Outcome) -> Self {
        let was_correct = prediction_data.prediction == Some(actual_outcome);
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now().naive_local(),
            prediction_data,
            actual_outcome,
            was_correct,
        }
    }

    pub fn sequence(&self) -> &[Outcome] {
        &self.prediction_data.user_sequence
    }
}

/// Track record of feedback whose input resembled a given sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub matched: usize,
    pub correct: usize,
}

impl FeedbackSummary {
    /// Records with an equally long input sequence at least `min_similarity` alike
    pub fn for_sequence(records: &[FeedbackRecord], sequence: &[Outcome], min_similarity: f64) -> Self {
        records
            .iter()
            .filter(|r| r.sequence().len() == sequence.len())
            .filter(|r| similarity(sequence, r.sequence()).meets(min_similarity))
            .fold(Self::default(), |mut summary, r| {
                summary.matched += 1;
                if r.was_correct {
                    summary.correct += 1;
                }
                summary
            })
    }

    pub fn accuracy(&self) -> Option<f64> {
        if self.matched == 0 {
            None
        } else {
            Some(self.correct as f64 / self.matched as f64)
        }
    }
}
