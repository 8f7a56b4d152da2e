use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Result of a single baccarat round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Player,
    Banker,
    Tie,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Player => "Player",
            Outcome::Banker => "Banker",
            Outcome::Tie => "Tie",
        }
    }

    /// Higher point total wins, equal totals tie
    pub fn from_totals(player_total: u8, banker_total: u8) -> Self {
        if player_total > banker_total {
            Outcome::Player
        } else if banker_total > player_total {
            Outcome::Banker
        } else {
            Outcome::Tie
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self, Outcome::Tie)
    }

    /// The forecastable side of this outcome, `None` for a tie
    pub fn as_call(&self) -> Option<Call> {
        match self {
            Outcome::Player => Some(Call::Player),
            Outcome::Banker => Some(Call::Banker),
            Outcome::Tie => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outcome '{0}' (expected Player, Banker or Tie)")]
pub struct ParseOutcomeError(pub String);

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p" | "player" => Ok(Outcome::Player),
            "b" | "banker" => Ok(Outcome::Banker),
            "t" | "tie" => Ok(Outcome::Tie),
            _ => Err(ParseOutcomeError(s.to_string())),
        }
    }
}

/// Parse a sequence written as `P,B,T`, `P B T` or `Player Banker Tie`
pub fn parse_sequence(input: &str) -> Result<Vec<Outcome>, ParseOutcomeError> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(Outcome::from_str)
        .collect()
}

/// A forecast is only ever made for one of the two betting sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    Player,
    Banker,
}

impl Call {
    pub fn as_str(&self) -> &'static str {
        match self {
            Call::Player => "Player",
            Call::Banker => "Banker",
        }
    }

    pub fn opposite(&self) -> Call {
        match self {
            Call::Player => Call::Banker,
            Call::Banker => Call::Player,
        }
    }

    pub fn matches(&self, outcome: Outcome) -> bool {
        Outcome::from(*self) == outcome
    }
}

impl From<Call> for Outcome {
    fn from(call: Call) -> Self {
        match call {
            Call::Player => Outcome::Player,
            Call::Banker => Outcome::Banker,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_totals() {
        assert_eq!(Outcome::from_totals(8, 3), Outcome::Player);
        assert_eq!(Outcome::from_totals(0, 9), Outcome::Banker);
        assert_eq!(Outcome::from_totals(6, 6), Outcome::Tie);
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("P".parse::<Outcome>().unwrap(), Outcome::Player);
        assert_eq!("banker".parse::<Outcome>().unwrap(), Outcome::Banker);
        assert_eq!(" Tie ".parse::<Outcome>().unwrap(), Outcome::Tie);
        assert!("X".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_parse_sequence() {
        let seq = parse_sequence("P,B, T Banker").unwrap();
        assert_eq!(seq, vec![Outcome::Player, Outcome::Banker, Outcome::Tie, Outcome::Banker]);
        assert!(parse_sequence("P,Q").is_err());
    }

    #[test]
    fn test_call_conversions() {
        assert_eq!(Outcome::Tie.as_call(), None);
        assert_eq!(Outcome::Player.as_call(), Some(Call::Player));
        assert_eq!(Call::Banker.opposite(), Call::Player);
        assert!(Call::Banker.matches(Outcome::Banker));
        assert!(!Call::Banker.matches(Outcome::Tie));
    }

    #[test]
    fn test_outcome_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Outcome::Banker).unwrap(), "\"Banker\"");
        let parsed: Outcome = serde_json::from_str("\"Tie\"").unwrap();
        assert_eq!(parsed, Outcome::Tie);
    }
}
