use serde::Serialize;
use std::collections::BTreeMap;

use crate::predictor::{Basis, ComponentResult, Prediction, PredictionResult};
use crate::types::Outcome;

/// Wire form of one predictor result: a call with a formatted confidence
/// or `{"error": reason}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionView {
    Call {
        prediction: Outcome,
        confidence: String,
        based_on: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        matches_found: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        component_predictions: Option<BTreeMap<String, PredictionView>>,
    },
    Error {
        error: String,
    },
}

impl PredictionView {
    pub fn from_result(result: &PredictionResult) -> Self {
        match result {
            Ok(prediction) => Self::from_prediction(prediction),
            Err(e) => PredictionView::Error { error: e.to_string() },
        }
    }

    fn from_prediction(prediction: &Prediction) -> Self {
        let mut confidence = format_confidence(prediction);
        if matches!(prediction.basis, Basis::BestFitShoe { .. }) {
            confidence.push_str(" (similarity)");
        }
        PredictionView::Call {
            prediction: prediction.call.into(),
            confidence,
            based_on: prediction.based_on(),
            matches_found: prediction.matches_found,
            component_predictions: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PredictionView::Error { .. })
    }
}

pub fn format_confidence(prediction: &Prediction) -> String {
    format!("{:.2}%", prediction.confidence)
}

/// Answer to one prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub historical_prediction: PredictionView,
    pub current_shoe_prediction: PredictionView,
    pub best_fit_shoe_prediction: PredictionView,
    pub sequential_prediction: PredictionView,
    pub weighted_prediction: PredictionView,
}

impl PredictionReport {
    /// `components` are the ensemble members by name; `sequential` is reported
    /// even when it did not vote.
    pub fn new(components: &[ComponentResult], sequential: &PredictionResult, weighted: &PredictionResult) -> Self {
        let view_of = |name: &str| {
            components
                .iter()
                .find(|c| c.name == name)
                .map(|c| PredictionView::from_result(&c.result))
                .unwrap_or_else(|| PredictionView::Error {
                    error: format!("predictor '{}' is not configured", name),
                })
        };

        let mut weighted_prediction = PredictionView::from_result(weighted);
        if let PredictionView::Call {
            component_predictions, ..
        } = &mut weighted_prediction
        {
            *component_predictions = Some(
                components
                    .iter()
                    .map(|c| (c.name.clone(), PredictionView::from_result(&c.result)))
                    .collect(),
            );
        }

        Self {
            historical_prediction: view_of("historical"),
            current_shoe_prediction: view_of("current_shoe"),
            best_fit_shoe_prediction: view_of("best_fit"),
            sequential_prediction: PredictionView::from_result(sequential),
            weighted_prediction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{combine, PredictionError};
    use crate::shoe::ShoeId;
    use crate::types::Call;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_views_render_legacy_shape() {
        let components = vec![
            ComponentResult {
                name: "historical".into(),
                result: Ok(Prediction::new(Call::Player, dec!(83.33), Basis::PatternMatch).with_matches(6)),
            },
            ComponentResult {
                name: "current_shoe".into(),
                result: Err(PredictionError::short_sequence(5, 2)),
            },
            ComponentResult {
                name: "best_fit".into(),
                result: Ok(Prediction::new(
                    Call::Banker,
                    dec!(80),
                    Basis::BestFitShoe {
                        shoe_id: ShoeId::from_number(4),
                    },
                )),
            },
        ];
        let sequential = Err(PredictionError::TooShort { needed: 2, got: 1 });
        let weighted = combine(&components);
        let report = PredictionReport::new(&components, &sequential, &weighted);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["historical_prediction"],
            json!({"prediction": "Player", "confidence": "83.33%", "based_on": "pattern_match", "matches_found": 6})
        );
        assert_eq!(value["best_fit_shoe_prediction"]["confidence"], json!("80.00% (similarity)"));
        assert!(value["current_shoe_prediction"]["error"].is_string());
        assert!(report.sequential_prediction.is_error());
        assert_eq!(value["weighted_prediction"]["prediction"], json!("Player"));
        assert_eq!(value["weighted_prediction"]["based_on"], json!("weighted_ensemble"));
        assert_eq!(
            value["weighted_prediction"]["component_predictions"]
                .as_object()
                .map(|m| m.len()),
            Some(3)
        );
    }

    #[test]
    fn test_missing_member_is_reported_as_error() {
        let report = PredictionReport::new(&[], &Err(PredictionError::TooShort { needed: 2, got: 1 }), &Err(PredictionError::NoValidPredictions));
        assert!(report.historical_prediction.is_error());
        assert_eq!(
            report.weighted_prediction,
            PredictionView::Error {
                error: "no valid predictions available".into()
            }
        );
    }
}
