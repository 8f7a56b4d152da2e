use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{
    Basis, BestFitShoePredictor, CurrentShoePredictor, FeedbackAdjusted, HistoricalPredictor, Prediction,
    PredictionContext, PredictionError, PredictionResult, Predictor, SequentialPredictor,
};
use crate::config::EngineConfig;
use crate::types::Call;

/// Output of one ensemble member, kept for transparency
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    pub name: String,
    pub result: PredictionResult,
}

/// Confidence-weighted vote over independent predictors
pub struct EnsemblePredictor {
    members: Vec<Box<dyn Predictor>>,
}

impl EnsemblePredictor {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    /// Feedback-adjusted historical, current shoe and best fit; sequential
    /// joins only when the configuration asks for it.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut ensemble = Self::new();
        ensemble.add_member(Box::new(FeedbackAdjusted::new(
            HistoricalPredictor::new(config.historical.clone()),
            config.feedback.clone(),
        )));
        ensemble.add_member(Box::new(CurrentShoePredictor::new(config.current_shoe.clone())));
        ensemble.add_member(Box::new(BestFitShoePredictor::new(config.best_fit.clone())));
        if config.ensemble.include_sequential {
            ensemble.add_member(Box::new(SequentialPredictor::new(config.sequential.clone())));
        }
        ensemble
    }

    pub fn add_member(&mut self, member: Box<dyn Predictor>) {
        debug!("Ensemble: added predictor '{}'", member.name());
        self.members.push(member);
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Run every member independently
    pub fn run(&self, ctx: &PredictionContext<'_>) -> Vec<ComponentResult> {
        self.members
            .iter()
            .map(|member| {
                let result = member.predict(ctx);
                if let Err(e) = &result {
                    debug!("Predictor '{}' produced no call: {}", member.name(), e);
                }
                ComponentResult {
                    name: member.name().to_string(),
                    result,
                }
            })
            .collect()
    }
}

impl Default for EnsemblePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for EnsemblePredictor {
    fn name(&self) -> &str {
        "weighted"
    }

    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult {
        combine(&self.run(ctx))
    }
}

/// Sum confidences per called side over the successful components. The
/// side with the larger sum wins and reports its share of all votes; on
/// equal sums the side voted for first keeps the lead.
pub fn combine(components: &[ComponentResult]) -> PredictionResult {
    let mut votes: Vec<(Call, Decimal)> = Vec::with_capacity(2);
    for prediction in components.iter().filter_map(|c| c.result.as_ref().ok()) {
        match votes.iter_mut().find(|(call, _)| *call == prediction.call) {
            Some((_, total)) => *total += prediction.confidence,
            None => votes.push((prediction.call, prediction.confidence)),
        }
    }

    let Some(&(first_call, first_votes)) = votes.first() else {
        return Err(PredictionError::NoValidPredictions);
    };

    let (winner, winning_votes) = votes
        .iter()
        .skip(1)
        .fold((first_call, first_votes), |best, &(call, total)| {
            if total > best.1 {
                (call, total)
            } else {
                best
            }
        });

    let all_votes: Decimal = votes.iter().map(|(_, total)| *total).sum();
    let confidence = if all_votes.is_zero() {
        Decimal::ZERO
    } else {
        (winning_votes * dec!(100) / all_votes).round_dp(2)
    };

    debug!(
        "Ensemble vote: {} with {} of {} total confidence",
        winner, winning_votes, all_votes
    );
    Ok(Prediction::new(winner, confidence, Basis::WeightedEnsemble))
}
