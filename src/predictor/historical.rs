use tracing::debug;

use super::{percent, similarity, Basis, Prediction, PredictionContext, PredictionError, PredictionResult, Predictor, Tally};
use crate::config::HistoricalSettings;
use crate::types::{Call, Outcome};

/// Looks for the current sequence (or its closing streak) anywhere in the
/// full recorded history and reports what tended to come next.
pub struct HistoricalPredictor {
    settings: HistoricalSettings,
}

impl HistoricalPredictor {
    pub fn new(settings: HistoricalSettings) -> Self {
        Self { settings }
    }

    /// When the sequence closes on a streak, check how often that streak
    /// broke in history. Only a clear majority of breaks produces a call.
    fn streak_break(&self, sequence: &[Outcome], history: &[Outcome]) -> Option<Prediction> {
        let length = self.settings.streak_length;
        if sequence.len() < length {
            return None;
        }

        let tail = &sequence[sequence.len() - length..];
        let streak = tail[0].as_call()?;
        if tail.iter().any(|o| *o != tail[0]) {
            return None;
        }
        let opposite = streak.opposite();

        let mut continues = 0;
        let mut breaks = 0;
        for window in history.windows(length + 1) {
            if &window[..length] != tail {
                continue;
            }
            match window[length].as_call() {
                Some(next) if next == streak => continues += 1,
                Some(next) if next == opposite => breaks += 1,
                _ => {}
            }
        }

        let total = continues + breaks;
        debug!(
            "Streak of {}x {}: {} continued, {} broke",
            length, streak, continues, breaks
        );
        if total > self.settings.min_streak_events && breaks > continues {
            Some(
                Prediction::new(opposite, percent(breaks, total), Basis::StreakBreak { streak, length })
                    .with_matches(total),
            )
        } else {
            None
        }
    }

    fn windowed_match(&self, sequence: &[Outcome], history: &[Outcome]) -> PredictionResult {
        let n = sequence.len();
        if history.len() <= n {
            return Err(PredictionError::InsufficientData {
                needed: n + 1,
                got: history.len(),
                scope: "historical rounds",
            });
        }

        // a window only counts when it is similar and followed by a non-tie
        let mut followers = Tally::default();
        for (start, window) in history.windows(n).enumerate() {
            let Some(&next) = history.get(start + n) else {
                break;
            };
            if next.is_tie() || !similarity(sequence, window).meets(self.settings.similarity_threshold) {
                continue;
            }
            followers.record(next);
        }

        if followers.is_empty() {
            return Ok(Self::sequence_majority(sequence));
        }

        debug!(
            "Historical match: {} similar windows (P={}, B={})",
            followers.total(),
            followers.player,
            followers.banker
        );
        let (call, confidence) = followers.verdict(Call::Player);
        Ok(Prediction::new(call, confidence, Basis::PatternMatch).with_matches(followers.total()))
    }

    /// Nothing in history resembles the sequence: go with its own majority
    fn sequence_majority(sequence: &[Outcome]) -> Prediction {
        let tally = Tally::from_outcomes(sequence);
        if tally.is_empty() {
            return Prediction::no_confidence(Basis::NoData);
        }
        let (call, confidence) = tally.verdict(Call::Banker);
        Prediction::new(call, confidence, Basis::SequenceMajority)
    }
}

impl Predictor for HistoricalPredictor {
    fn name(&self) -> &str {
        "historical"
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        if ctx.sequence.is_empty() {
            return Err(PredictionError::short_sequence(1, 0));
        }

        if let Some(prediction) = self.streak_break(ctx.sequence, ctx.history) {
            return Ok(prediction);
        }

        self.windowed_match(ctx.sequence, ctx.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome::{Banker as B, Player as P, Tie as T};
    use rust_decimal_macros::dec;

    fn predictor() -> HistoricalPredictor {
        HistoricalPredictor::new(HistoricalSettings::default())
    }

    fn run(sequence: &[Outcome], history: &[Outcome]) -> PredictionResult {
        predictor().predict(&PredictionContext::new(sequence).with_history(history))
    }

    #[test]
    fn test_alternating_history() {
        let history = [P, B, P, B, P, B, P, B];
        let prediction = run(&[P, B], &history).unwrap();
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.confidence, dec!(100));
        assert_eq!(prediction.basis, Basis::PatternMatch);
        assert_eq!(prediction.matches_found, Some(3));
    }

    #[test]
    fn test_history_must_be_longer_than_sequence() {
        let err = run(&[P, B, P], &[P, B, P]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InsufficientData { needed: 4, got: 3, .. }
        ));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        assert!(matches!(
            run(&[], &[P, B]),
            Err(PredictionError::InsufficientData { needed: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_streak_break_short_circuits() {
        // six P-P-P streaks in history: five broke, one continued
        let mut history = Vec::new();
        for _ in 0..5 {
            history.extend([P, P, P, B, T]);
        }
        history.extend([P, P, P, P, T]);

        let prediction = run(&[B, P, P, P], &history).unwrap();
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(83.33));
        assert_eq!(prediction.matches_found, Some(6));
        assert_eq!(prediction.basis, Basis::StreakBreak { streak: Call::Player, length: 3 });
    }

    #[test]
    fn test_streak_needs_more_than_five_events() {
        let mut history = Vec::new();
        for _ in 0..5 {
            history.extend([P, P, P, B, T]);
        }
        let prediction = run(&[P, P, P], &history).unwrap();
        assert_ne!(prediction.basis, Basis::StreakBreak { streak: Call::Player, length: 3 });
    }

    #[test]
    fn test_tie_streak_is_not_a_streak() {
        let history = [T, T, T, P, T, T, T, P, T, T, T, P, T, T, T, P, T, T, T, P, T, T, T, P];
        let result = run(&[T, T, T], &history).unwrap();
        assert_eq!(result.basis, Basis::PatternMatch);
        assert_eq!(result.call, Call::Player);
    }

    #[test]
    fn test_fallback_to_sequence_majority() {
        let history = [T, T, T, T, T, T, T, T];
        let prediction = run(&[P, P, B], &history).unwrap();
        assert_eq!(prediction.basis, Basis::SequenceMajority);
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.confidence, dec!(66.67));
    }

    #[test]
    fn test_fallback_even_split_goes_to_banker() {
        let history = [T, T, T, T, T, T];
        let prediction = run(&[P, B], &history).unwrap();
        assert_eq!(prediction.basis, Basis::SequenceMajority);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(50));
    }

    #[test]
    fn test_all_tie_sequence_without_match_has_no_data() {
        let history = [P, B, P, B, P, B];
        let prediction = run(&[T, T], &history).unwrap();
        assert_eq!(prediction.basis, Basis::NoData);
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(0));
    }

    #[test]
    fn test_similar_windows_followed_only_by_ties_fall_back() {
        let history = [P, P, B, T, B, B, B, B];
        let prediction = run(&[P, P, B], &history).unwrap();
        assert_eq!(prediction.basis, Basis::SequenceMajority);
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.confidence, dec!(66.67));
        assert_eq!(prediction.matches_found, None);
    }

    #[test]
    fn test_even_followers_go_to_player() {
        let history = [P, B, P, P, B, B];
        let prediction = run(&[P, B], &history).unwrap();
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.confidence, dec!(50));
        assert_eq!(prediction.matches_found, Some(2));
    }
}
