use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::Outcome;

/// Card rank; suits play no part in baccarat scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "A" => Some(Rank::Ace),
            "2" => Some(Rank::Two),
            "3" => Some(Rank::Three),
            "4" => Some(Rank::Four),
            "5" => Some(Rank::Five),
            "6" => Some(Rank::Six),
            "7" => Some(Rank::Seven),
            "8" => Some(Rank::Eight),
            "9" => Some(Rank::Nine),
            "10" => Some(Rank::Ten),
            "J" => Some(Rank::Jack),
            "Q" => Some(Rank::Queen),
            "K" => Some(Rank::King),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    /// Baccarat point value: ace is 1, tens and court cards are 0
    pub fn value(&self) -> u8 {
        match self {
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandError {
    #[error("invalid hand '{input}': unknown card '{symbol}'")]
    UnknownRank { input: String, symbol: String },
    #[error("invalid hand '{input}': expected 2 or 3 cards, got {count}")]
    CardCount { input: String, count: usize },
}

/// Two or three dealt cards, stored in canonical `A-10-K` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hand {
    cards: Vec<Rank>,
}

impl Hand {
    pub const MIN_CARDS: usize = 2;
    pub const MAX_CARDS: usize = 3;

    pub fn parse(input: &str) -> Result<Self, HandError> {
        let symbols: Vec<String> = input.split('-').map(|p| p.trim().to_uppercase()).collect();

        let mut cards = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            match Rank::from_symbol(symbol) {
                Some(rank) => cards.push(rank),
                None => {
                    return Err(HandError::UnknownRank {
                        input: input.to_string(),
                        symbol: symbol.clone(),
                    })
                }
            }
        }

        if !(Self::MIN_CARDS..=Self::MAX_CARDS).contains(&cards.len()) {
            return Err(HandError::CardCount {
                input: input.to_string(),
                count: cards.len(),
            });
        }

        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }

    /// Point total, sum of card values mod 10
    pub fn total(&self) -> u8 {
        self.cards.iter().map(|c| c.value()).sum::<u8>() % 10
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<&str> = self.cards.iter().map(|c| c.symbol()).collect();
        write!(f, "{}", symbols.join("-"))
    }
}

impl TryFrom<String> for Hand {
    type Error = HandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Hand::parse(&value)
    }
}

impl From<Hand> for String {
    fn from(hand: Hand) -> Self {
        hand.to_string()
    }
}

/// Player and banker hands dealt in the same round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandPair {
    pub player: Hand,
    pub banker: Hand,
}

impl HandPair {
    pub fn new(player: Hand, banker: Hand) -> Self {
        Self { player, banker }
    }

    pub fn parse(player: &str, banker: &str) -> Result<Self, HandError> {
        Ok(Self::new(Hand::parse(player)?, Hand::parse(banker)?))
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_totals(self.player.total(), self.banker.total())
    }
}

/// Serde adapter for stored hands. Rounds migrated from the pre-shoe data
/// format carry `"N/A"` instead of cards and load as `None`; any other value
/// must be a valid hand.
pub mod legacy_hand {
    use super::*;

    pub const PLACEHOLDER: &str = "N/A";

    pub fn serialize<S: Serializer>(hand: &Option<Hand>, serializer: S) -> Result<S::Ok, S::Error> {
        match hand {
            Some(hand) => serializer.serialize_str(&hand.to_string()),
            None => serializer.serialize_str(PLACEHOLDER),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hand>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim() == PLACEHOLDER => Ok(None),
            Some(raw) => Hand::parse(&raw).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
