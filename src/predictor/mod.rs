pub mod similarity;
pub mod historical;
pub mod feedback;
pub mod current_shoe;
pub mod best_fit;
pub mod sequential;
pub mod ensemble;

pub use similarity::{similarity, Similarity};
pub use historical::HistoricalPredictor;
pub use feedback::FeedbackAdjusted;
pub use current_shoe::CurrentShoePredictor;
pub use best_fit::BestFitShoePredictor;
pub use sequential::SequentialPredictor;
pub use ensemble::{combine, ComponentResult, EnsemblePredictor};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use thiserror::Error;

use crate::feedback::FeedbackRecord;
use crate::shoe::{PastShoe, ShoeId};
use crate::types::{Call, Outcome};

/// Everything a predictor may look at for one request
#[derive(Debug, Clone, Copy)]
pub struct PredictionContext<'a> {
    /// Rounds of the shoe in progress, as supplied by the caller
    pub sequence: &'a [Outcome],
    /// Every recorded outcome across all shoes
    pub history: &'a [Outcome],
    pub past_shoes: &'a [PastShoe],
    pub feedback: &'a [FeedbackRecord],
}

impl<'a> PredictionContext<'a> {
    pub fn new(sequence: &'a [Outcome]) -> Self {
        Self {
            sequence,
            history: &[],
            past_shoes: &[],
            feedback: &[],
        }
    }

    pub fn with_history(mut self, history: &'a [Outcome]) -> Self {
        self.history = history;
        self
    }

    pub fn with_past_shoes(mut self, past_shoes: &'a [PastShoe]) -> Self {
        self.past_shoes = past_shoes;
        self
    }

    pub fn with_feedback(mut self, feedback: &'a [FeedbackRecord]) -> Self {
        self.feedback = feedback;
        self
    }
}

pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, ctx: &PredictionContext<'_>) -> PredictionResult;
}

pub type PredictionResult = Result<Prediction, PredictionError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("need at least {needed} {scope}, got {got}")]
    InsufficientData {
        needed: usize,
        got: usize,
        scope: &'static str,
    },
    #[error("sequence too short: need at least {needed} rounds, got {got}")]
    TooShort { needed: usize, got: usize },
    #[error("no similar past shoe found (best match was only {:.0}% similar)", .best_ratio * 100.0)]
    NoSimilarShoe { best_ratio: f64 },
    #[error("no valid predictions available")]
    NoValidPredictions,
}

impl PredictionError {
    pub fn short_sequence(needed: usize, got: usize) -> Self {
        PredictionError::InsufficientData {
            needed,
            got,
            scope: "rounds in the sequence",
        }
    }
}

/// How a prediction was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Basis {
    StreakBreak { streak: Call, length: usize },
    PatternMatch,
    SequenceMajority,
    NoData,
    ShoePattern { length: usize },
    ShoeFallbackAfterTie,
    ShoeFallbackNoTransitions,
    ShoeTransition,
    BestFitShoe { shoe_id: ShoeId },
    Transition { from: Call },
    TransitionAfterTie,
    TransitionUnseen { from: Call },
    WeightedEnsemble,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::StreakBreak { streak, length } => {
                write!(f, "streak_break_analysis (after {}x {})", length, streak)
            }
            Basis::PatternMatch => write!(f, "pattern_match"),
            Basis::SequenceMajority => write!(f, "fallback_logic"),
            Basis::NoData => write!(f, "fallback_no_data"),
            Basis::ShoePattern { length } => {
                write!(f, "current_shoe_pattern_match ({}-round pattern)", length)
            }
            Basis::ShoeFallbackAfterTie => write!(f, "shoe_fallback (after tie)"),
            Basis::ShoeFallbackNoTransitions => write!(f, "shoe_fallback (no transitions found)"),
            Basis::ShoeTransition => write!(f, "shoe_transition_fallback"),
            Basis::BestFitShoe { shoe_id } => write!(f, "best_fit_shoe_match (shoe {})", shoe_id),
            Basis::Transition { from } => write!(f, "sequential_transition (after {})", from),
            Basis::TransitionAfterTie => write!(f, "sequential_fallback (after tie)"),
            Basis::TransitionUnseen { from } => {
                write!(f, "sequential_fallback (no transitions from {})", from)
            }
            Basis::WeightedEnsemble => write!(f, "weighted_ensemble"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub call: Call,
    /// Percentage in [0, 100], two decimals
    pub confidence: Decimal,
    pub basis: Basis,
    pub matches_found: Option<usize>,
    pub feedback_adjusted: bool,
}

impl Prediction {
    pub fn new(call: Call, confidence: Decimal, basis: Basis) -> Self {
        Self {
            call,
            confidence,
            basis,
            matches_found: None,
            feedback_adjusted: false,
        }
    }

    /// Banker at 0%, used whenever a fallback has nothing to go on
    pub fn no_confidence(basis: Basis) -> Self {
        Self::new(Call::Banker, Decimal::ZERO, basis)
    }

    pub fn with_matches(mut self, matches: usize) -> Self {
        self.matches_found = Some(matches);
        self
    }

    pub fn based_on(&self) -> String {
        if self.feedback_adjusted {
            format!("{} + feedback_adjusted", self.basis)
        } else {
            self.basis.to_string()
        }
    }
}

/// Player/Banker counts; ties are never counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub player: usize,
    pub banker: usize,
}

impl Tally {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            tally.record(*outcome);
        }
        tally
    }

    /// Returns false when the outcome was a tie and nothing was counted
    pub fn record(&mut self, outcome: Outcome) -> bool {
        match outcome.as_call() {
            Some(Call::Player) => self.player += 1,
            Some(Call::Banker) => self.banker += 1,
            None => return false,
        }
        true
    }

    pub fn count(&self, call: Call) -> usize {
        match call {
            Call::Player => self.player,
            Call::Banker => self.banker,
        }
    }

    pub fn total(&self) -> usize {
        self.player + self.banker
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Side with more votes; `on_even` takes an even split
    pub fn leader(&self, on_even: Call) -> Call {
        match self.player.cmp(&self.banker) {
            std::cmp::Ordering::Greater => Call::Player,
            std::cmp::Ordering::Less => Call::Banker,
            std::cmp::Ordering::Equal => on_even,
        }
    }

    pub fn share(&self, call: Call) -> Decimal {
        percent(self.count(call), self.total())
    }

    /// Majority call with its share of the tally
    pub fn verdict(&self, on_even: Call) -> (Call, Decimal) {
        let call = self.leader(on_even);
        (call, self.share(call))
    }
}

/// `part / whole` as a percentage rounded to two decimals
pub fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part as u64) * dec!(100) / Decimal::from(whole as u64)).round_dp(2)
}
