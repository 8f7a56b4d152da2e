use tracing::debug;

use super::{similarity, Basis, Prediction, PredictionContext, PredictionError, PredictionResult, Predictor, Similarity};
use crate::config::BestFitSettings;
use crate::shoe::PastShoe;
use crate::types::Call;

/// Finds the finished shoe whose opening rounds look most like the current
/// sequence and predicts what that shoe did next.
pub struct BestFitShoePredictor {
    settings: BestFitSettings,
}

struct Candidate<'a> {
    shoe: &'a PastShoe,
    similarity: Similarity,
    next: Call,
}

impl BestFitShoePredictor {
    pub fn new(settings: BestFitSettings) -> Self {
        Self { settings }
    }
}

impl Predictor for BestFitShoePredictor {
    fn name(&self) -> &str {
        "best_fit"
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        let sequence = ctx.sequence;
        let n = sequence.len();
        if n < self.settings.min_rounds {
            return Err(PredictionError::short_sequence(self.settings.min_rounds, n));
        }

        let mut best: Option<Candidate<'_>> = None;
        let mut best_ratio = 0.0;
        for shoe in ctx.past_shoes.iter().filter(|s| s.outcomes.len() > n) {
            let score = similarity(sequence, &shoe.outcomes[..n]);
            if score.ratio() <= best_ratio {
                continue;
            }
            // a tie after the prefix says nothing, keep the previous best
            if let Some(next) = shoe.outcomes[n].as_call() {
                best_ratio = score.ratio();
                best = Some(Candidate { shoe, similarity: score, next });
            }
        }

        match best {
            Some(candidate) if best_ratio >= self.settings.min_similarity => {
                debug!(
                    "Best fit shoe {} at {:.2} similarity, next was {}",
                    candidate.shoe.shoe_id, best_ratio, candidate.next
                );
                Ok(Prediction::new(
                    candidate.next,
                    candidate.similarity.percent(),
                    Basis::BestFitShoe { shoe_id: candidate.shoe.shoe_id.clone() },
                ))
            }
            _ => Err(PredictionError::NoSimilarShoe { best_ratio }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shoe::ShoeId;
    use crate::types::Outcome;
    use crate::types::Outcome::{Banker as B, Player as P, Tie as T};
    use rust_decimal_macros::dec;

    fn shoe(n: u64, outcomes: &[Outcome]) -> PastShoe {
        PastShoe {
            shoe_id: ShoeId::from_number(n),
            outcomes: outcomes.to_vec(),
        }
    }

    fn run(sequence: &[Outcome], shoes: &[PastShoe]) -> PredictionResult {
        BestFitShoePredictor::new(BestFitSettings::default())
            .predict(&PredictionContext::new(sequence).with_past_shoes(shoes))
    }

    #[test]
    fn test_requires_five_rounds() {
        let shoes = [shoe(1, &[P, B, P, B, P, B])];
        assert_eq!(run(&[P, B, P, B], &shoes), Err(PredictionError::short_sequence(5, 4)));
    }

    #[test]
    fn test_picks_most_similar_prefix() {
        let shoes = [
            shoe(1, &[P, B, P, B, B, P, P]),
            shoe(2, &[P, B, P, B, P, B, B]),
            shoe(3, &[B, B, B, B, B, B, B]),
        ];
        let prediction = run(&[P, B, P, B, P], &shoes).unwrap();
        assert_eq!(prediction.call, Call::Banker);
        assert_eq!(prediction.confidence, dec!(100));
        assert_eq!(prediction.basis, Basis::BestFitShoe { shoe_id: ShoeId::from_number(2) });
        assert_eq!(prediction.based_on(), "best_fit_shoe_match (shoe shoe_2)");
    }

    #[test]
    fn test_earlier_shoe_wins_equal_ratio() {
        let shoes = [
            shoe(1, &[P, B, P, B, P, P]),
            shoe(2, &[P, B, P, B, P, B]),
        ];
        let prediction = run(&[P, B, P, B, P], &shoes).unwrap();
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.basis, Basis::BestFitShoe { shoe_id: ShoeId::from_number(1) });
    }

    #[test]
    fn test_tie_after_prefix_is_skipped() {
        let shoes = [
            shoe(1, &[P, B, P, B, P, T]),
            shoe(2, &[P, B, P, B, B, P]),
        ];
        let prediction = run(&[P, B, P, B, P], &shoes).unwrap();
        assert_eq!(prediction.basis, Basis::BestFitShoe { shoe_id: ShoeId::from_number(2) });
        assert_eq!(prediction.call, Call::Player);
        assert_eq!(prediction.confidence, dec!(80));
    }

    #[test]
    fn test_shoes_not_longer_than_sequence_are_ignored() {
        let shoes = [shoe(1, &[P, B, P, B, P])];
        assert_eq!(
            run(&[P, B, P, B, P], &shoes),
            Err(PredictionError::NoSimilarShoe { best_ratio: 0.0 })
        );
    }

    #[test]
    fn test_dissimilar_shoes_are_rejected() {
        let shoes = [shoe(1, &[B, B, T, T, B, P])];
        let err = run(&[P, P, P, P, P], &shoes).unwrap_err();
        assert!(matches!(err, PredictionError::NoSimilarShoe { best_ratio } if best_ratio < 0.7));
    }

    #[test]
    fn test_all_tie_sequence_finds_nothing() {
        let shoes = [shoe(1, &[P, B, P, B, P, B])];
        assert!(matches!(
            run(&[T, T, T, T, T], &shoes),
            Err(PredictionError::NoSimilarShoe { .. })
        ));
    }
}
