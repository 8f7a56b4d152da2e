pub mod id;
pub mod log;

pub use id::*;
pub use log::*;

use thiserror::Error;

use crate::types::{HandError, Outcome};

#[derive(Debug, Error)]
pub enum ShoeError {
    #[error(transparent)]
    InvalidHand(#[from] HandError),
    #[error("outcome {claimed} does not match card totals ({computed})")]
    OutcomeMismatch { claimed: Outcome, computed: Outcome },
    #[error("no active shoe, start a new shoe first")]
    NoActiveShoe,
    #[error("no active shoe to end")]
    NoActiveShoeToEnd,
}
