use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a shoe as written to the event log.
///
/// New ids are always `shoe_<n>`. Logs written by older tooling may contain
/// other shapes, so the numeric part is recovered from the first run of
/// digits in the id; ids without digits simply take no part in numbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoeId(String);

impl ShoeId {
    pub const PREFIX: &'static str = "shoe_";

    pub fn from_number(number: u64) -> Self {
        Self(format!("{}{}", Self::PREFIX, number))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> Option<u64> {
        let digits: String = self
            .0
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }
}

impl fmt::Display for ShoeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
