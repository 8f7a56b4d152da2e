use tracing::debug;

use super::{similarity, Basis, Prediction, PredictionContext, PredictionError, PredictionResult, Predictor, Tally};
use crate::config::CurrentShoeSettings;
use crate::types::{Call, Outcome};

/// Searches the shoe in progress for earlier stretches resembling its most
/// recent rounds, longest pattern first.
pub struct CurrentShoePredictor {
    settings: CurrentShoeSettings,
}

impl CurrentShoePredictor {
    pub fn new(settings: CurrentShoeSettings) -> Self {
        Self { settings }
    }

    fn pattern_match(&self, sequence: &[Outcome], length: usize) -> Option<Prediction> {
        let (earlier, pattern) = sequence.split_at(sequence.len() - length);
        let threshold = self.settings.threshold_for(length);

        let mut followers = Tally::default();
        for (start, window) in earlier.windows(length).enumerate() {
            if !similarity(pattern, window).meets(threshold) {
                continue;
            }
            if let Some(&next) = earlier.get(start + length) {
                followers.record(next);
            }
        }

        if followers.is_empty() {
            return None;
        }

        debug!(
            "Current shoe: {}-round pattern matched {} times (P={}, B={})",
            length,
            followers.total(),
            followers.player,
            followers.banker
        );
        let (call, confidence) = followers.verdict(Call::Player);
        Some(Prediction::new(call, confidence, Basis::ShoePattern { length }).with_matches(followers.total()))
    }

    /// What followed earlier occurrences of the latest outcome
    fn transition_fallback(sequence: &[Outcome]) -> Prediction {
        let Some(&last) = sequence.last() else {
            return Prediction::no_confidence(Basis::ShoeFallbackNoTransitions);
        };
        if last.is_tie() {
            return Prediction::no_confidence(Basis::ShoeFallbackAfterTie);
        }

        let mut transitions = Tally::default();
        for pair in sequence.windows(2) {
            if pair[0] == last {
                transitions.record(pair[1]);
            }
        }

        if transitions.is_empty() {
            return Prediction::no_confidence(Basis::ShoeFallbackNoTransitions);
        }
        let (call, confidence) = transitions.verdict(Call::Banker);
        Prediction::new(call, confidence, Basis::ShoeTransition)
    }
}

impl Predictor for CurrentShoePredictor {
    fn name(&self) -> &str {
        "current_shoe"
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        let sequence = ctx.sequence;
        if sequence.len() < self.settings.min_rounds {
            return Err(PredictionError::short_sequence(self.settings.min_rounds, sequence.len()));
        }

        for length in (self.settings.min_pattern_len..=self.settings.max_pattern_len).rev() {
            if length == 0 || sequence.len() < length * 2 {
                continue;
            }
            if let Some(prediction) = self.pattern_match(sequence, length) {
                return Ok(prediction);
            }
        }

        debug!("Current shoe: no repeating pattern, using transition fallback");
        Ok(Self::transition_fallback(sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome::{Banker as B, Player as P, Tie as T};
    use rust_decimal_macros::dec;

    fn run(sequence: &[Outcome]) -> PredictionResult {
        CurrentShoePredictor::new(CurrentShoeSettings::default()).predict(&PredictionContext::new(sequence))
    }

    #[test]
    fn test_requires_five_rounds() {
        assert_eq!(
            run(&[P, B, P, B]),
            Err(PredictionError::short_sequence(5, 4))
        );
    }

    #[test]
    fn test_all_tie_sequence_falls_back_after_tie() {
        let prediction = run(&[T, T, T, T, T, T, T, T]).unwrap();
        assert_eq!(prediction.basis, Basis::ShoeFallbackAfterTie);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(0));
    }

    #[test]
    fn test_longest_pattern_wins() {
        // the trailing P-P-B-B-P-P-B repeats from the start and was followed by B
        let seq = [P, P, B, B, P, P, B, B, P, P, B, B, P, P, B];
        let prediction = run(&seq).unwrap();
        assert_eq!(prediction.basis, Basis::ShoePattern { length: 7 });
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(100));
        assert_eq!(prediction.matches_found, Some(1));
    }

    #[test]
    fn test_three_round_pattern() {
        // too short for 4+ round patterns; P-B-P occurred at the start and was followed by B
        let prediction = run(&[P, B, P, B, P, B, P]).unwrap();
        assert_eq!(prediction.basis, Basis::ShoePattern { length: 3 });
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(100));
        assert_eq!(prediction.matches_found, Some(1));
    }

    #[test]
    fn test_long_pattern_needs_strict_similarity() {
        // the 5-round pattern only shares 4 rounds with its earlier occurrence (0.8 < 0.9)
        let strict = CurrentShoeSettings { min_pattern_len: 5, ..CurrentShoeSettings::default() };
        let seq = [P, P, B, B, P, B, P, P, B, T, B];
        let prediction = CurrentShoePredictor::new(strict)
            .predict(&PredictionContext::new(&seq))
            .unwrap();
        assert_eq!(prediction.basis, Basis::ShoeTransition);
    }

    #[test]
    fn test_transition_fallback_even_split_goes_to_banker() {
        // after P came B once and P once
        let prediction = run(&[B, P, B, P, P]).unwrap();
        assert_eq!(prediction.basis, Basis::ShoeTransition);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(50));
    }

    #[test]
    fn test_transition_fallback_majority() {
        let prediction = run(&[P, B, P, B, P]).unwrap();
        assert_eq!(prediction.basis, Basis::ShoeTransition);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(100));
    }

    #[test]
    fn test_no_transitions_from_last_outcome() {
        let prediction = run(&[T, T, T, T, T, B]).unwrap();
        assert_eq!(prediction.basis, Basis::ShoeFallbackNoTransitions);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(0));
    }
}
