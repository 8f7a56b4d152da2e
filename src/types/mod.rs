pub mod outcome;
pub mod hand;

pub use outcome::*;
pub use hand::*;
