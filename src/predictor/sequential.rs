use tracing::debug;

use super::{Basis, Prediction, PredictionContext, PredictionError, PredictionResult, Predictor, Tally};
use crate::config::SequentialSettings;
use crate::types::Call;

/// First-order transition model over Player/Banker within the sequence
pub struct SequentialPredictor {
    settings: SequentialSettings,
}

/// Transition counts keyed by the side transitioned from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionTable {
    pub from_player: Tally,
    pub from_banker: Tally,
}

impl TransitionTable {
    pub fn row(&self, from: Call) -> &Tally {
        match from {
            Call::Player => &self.from_player,
            Call::Banker => &self.from_banker,
        }
    }

    fn row_mut(&mut self, from: Call) -> &mut Tally {
        match from {
            Call::Player => &mut self.from_player,
            Call::Banker => &mut self.from_banker,
        }
    }
}

impl SequentialPredictor {
    pub fn new(settings: SequentialSettings) -> Self {
        Self { settings }
    }

    pub fn transitions(sequence: &[crate::types::Outcome]) -> TransitionTable {
        let mut table = TransitionTable::default();
        for pair in sequence.windows(2) {
            if let Some(from) = pair[0].as_call() {
                table.row_mut(from).record(pair[1]);
            }
        }
        table
    }
}

impl Predictor for SequentialPredictor {
    fn name(&self) -> &str {
        "sequential"
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        let sequence = ctx.sequence;
        if sequence.len() < self.settings.min_rounds {
            return Err(PredictionError::TooShort {
                needed: self.settings.min_rounds,
                got: sequence.len(),
            });
        }

        let table = Self::transitions(sequence);
        let Some(from) = sequence.last().and_then(|o| o.as_call()) else {
            return Ok(Prediction::no_confidence(Basis::TransitionAfterTie));
        };

        let row = table.row(from);
        if row.is_empty() {
            return Ok(Prediction::no_confidence(Basis::TransitionUnseen { from }));
        }

        debug!("Transitions from {}: P={}, B={}", from, row.player, row.banker);
        let (call, confidence) = row.verdict(Call::Banker);
        Ok(Prediction::new(call, confidence, Basis::Transition { from }).with_matches(row.total()))
    }
}
