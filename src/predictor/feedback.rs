use rust_decimal::Decimal;
use tracing::debug;

use super::{Prediction, PredictionContext, PredictionResult, Predictor};
use crate::config::FeedbackSettings;
use crate::feedback::{FeedbackRecord, FeedbackSummary};
use crate::types::Outcome;

/// Scales down the wrapped predictor's confidence when feedback on similar
/// sequences shows that calls like this one were mostly wrong.
pub struct FeedbackAdjusted<P> {
    inner: P,
    settings: FeedbackSettings,
}

impl<P: Predictor> FeedbackAdjusted<P> {
    pub fn new(inner: P, settings: FeedbackSettings) -> Self {
        Self { inner, settings }
    }

    pub fn adjust(&self, sequence: &[Outcome], feedback: &[FeedbackRecord], mut prediction: Prediction) -> Prediction {
        if sequence.len() < self.settings.min_sequence_len {
            return prediction;
        }

        let summary = FeedbackSummary::for_sequence(feedback, sequence, self.settings.min_similarity);
        if summary.matched < self.settings.min_records {
            return prediction;
        }

        let Some(accuracy) = summary.accuracy() else {
            return prediction;
        };
        if accuracy >= self.settings.accuracy_floor {
            return prediction;
        }

        let factor = Decimal::from(summary.correct as u64) / Decimal::from(summary.matched as u64);
        let adjusted = (prediction.confidence * factor).round_dp(2);
        debug!(
            "Feedback accuracy {}/{} on similar sequences: confidence {} -> {}",
            summary.correct, summary.matched, prediction.confidence, adjusted
        );
        prediction.confidence = adjusted;
        prediction.feedback_adjusted = true;
        prediction
    }
}

impl<P: Predictor> Predictor for FeedbackAdjusted<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        let prediction = self.inner.predict(ctx)?;
        Ok(self.adjust(ctx.sequence, ctx.feedback, prediction))
    }
}
