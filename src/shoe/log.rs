use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::{ShoeError, ShoeId};
use crate::types::{legacy_hand, Hand, HandPair, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShoeEventKind {
    #[serde(rename = "SHOE_START")]
    Start,
    #[serde(rename = "SHOE_END")]
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoeEvent {
    #[serde(rename = "event")]
    pub kind: ShoeEventKind,
    pub shoe_id: ShoeId,
}

impl ShoeEvent {
    pub fn start(shoe_id: ShoeId) -> Self {
        Self { kind: ShoeEventKind::Start, shoe_id }
    }

    pub fn end(shoe_id: ShoeId) -> Self {
        Self { kind: ShoeEventKind::End, shoe_id }
    }
}

/// One recorded round. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default, with = "legacy_hand")]
    pub player_hand: Option<Hand>,
    #[serde(default, with = "legacy_hand")]
    pub banker_hand: Option<Hand>,
    pub outcome: Outcome,
    pub shoe_id: ShoeId,
    #[serde(rename = "round", default)]
    pub round_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Event(ShoeEvent),
    Round(Round),
}

impl LogEntry {
    pub fn shoe_id(&self) -> &ShoeId {
        match self {
            LogEntry::Event(event) => &event.shoe_id,
            LogEntry::Round(round) => &round.shoe_id,
        }
    }

    pub fn as_round(&self) -> Option<&Round> {
        match self {
            LogEntry::Round(round) => Some(round),
            LogEntry::Event(_) => None,
        }
    }

    fn is_event(&self, kind: ShoeEventKind) -> bool {
        matches!(self, LogEntry::Event(event) if event.kind == kind)
    }
}

/// Where the log currently stands with respect to shoes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoeState {
    /// Shoe named by the most recent START marker
    pub shoe_id: Option<ShoeId>,
    pub is_active: bool,
    /// Log position of that START marker
    pub start_index: Option<usize>,
}

impl ShoeState {
    pub fn active_shoe(&self) -> Option<&ShoeId> {
        if self.is_active {
            self.shoe_id.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PastShoe {
    pub shoe_id: ShoeId,
    pub outcomes: Vec<Outcome>,
}

/// Entries appended by a `start_shoe` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoeStart {
    pub ended: Option<ShoeId>,
    pub started: ShoeId,
}

/// Append-only log of rounds and shoe lifecycle markers
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    highest_shoe_number: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        let highest_shoe_number = entries
            .iter()
            .filter_map(|e| e.shoe_id().number())
            .max()
            .unwrap_or(0);

        Self {
            entries,
            highest_shoe_number,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries appended after the log had `mark` entries
    pub fn entries_since(&self, mark: usize) -> &[LogEntry] {
        &self.entries[mark.min(self.entries.len())..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.entries.iter().filter_map(LogEntry::as_round)
    }

    /// The latest START decides the state: it is active unless an END with
    /// the same id appears anywhere in the log.
    pub fn shoe_state(&self) -> ShoeState {
        let ended: HashSet<&ShoeId> = self
            .entries
            .iter()
            .filter(|e| e.is_event(ShoeEventKind::End))
            .map(|e| e.shoe_id())
            .collect();

        self.entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, e)| e.is_event(ShoeEventKind::Start))
            .map(|(idx, e)| ShoeState {
                shoe_id: Some(e.shoe_id().clone()),
                is_active: !ended.contains(e.shoe_id()),
                start_index: Some(idx),
            })
            .unwrap_or_default()
    }

    /// Every round outcome in log order, across all shoes
    pub fn all_outcomes(&self) -> Vec<Outcome> {
        self.rounds().map(|r| r.outcome).collect()
    }

    /// Outcomes grouped per shoe in order of first appearance, skipping `exclude`
    pub fn past_shoes(&self, exclude: Option<&ShoeId>) -> Vec<PastShoe> {
        let mut shoes: Vec<PastShoe> = Vec::new();
        let mut positions: HashMap<&ShoeId, usize> = HashMap::new();

        for round in self.rounds() {
            if Some(&round.shoe_id) == exclude {
                continue;
            }
            let pos = *positions.entry(&round.shoe_id).or_insert_with(|| {
                shoes.push(PastShoe {
                    shoe_id: round.shoe_id.clone(),
                    outcomes: Vec::new(),
                });
                shoes.len() - 1
            });
            shoes[pos].outcomes.push(round.outcome);
        }

        shoes
    }

    /// Rounds logged under the active shoe since its START marker
    pub fn current_shoe_rounds(&self) -> Vec<&Round> {
        let state = self.shoe_state();
        match (state.active_shoe(), state.start_index) {
            (Some(shoe_id), Some(start)) => self.entries[start..]
                .iter()
                .filter_map(LogEntry::as_round)
                .filter(|r| &r.shoe_id == shoe_id)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn next_shoe_id(&self) -> ShoeId {
        ShoeId::from_number(self.highest_shoe_number + 1)
    }

    /// Ends the active shoe (if any) and opens a freshly numbered one
    pub fn start_shoe(&mut self) -> ShoeStart {
        let ended = self.shoe_state().active_shoe().cloned();
        if let Some(shoe_id) = &ended {
            info!("Ending {} before starting a new shoe", shoe_id);
            self.push(LogEntry::Event(ShoeEvent::end(shoe_id.clone())));
        }

        let started = self.next_shoe_id();
        self.push(LogEntry::Event(ShoeEvent::start(started.clone())));
        info!("Started {}", started);

        ShoeStart { ended, started }
    }

    pub fn record_round(&mut self, hands: HandPair, outcome: Outcome) -> Result<Round, ShoeError> {
        let state = self.shoe_state();
        let (shoe_id, start) = match (state.active_shoe(), state.start_index) {
            (Some(shoe_id), Some(start)) => (shoe_id.clone(), start),
            _ => return Err(ShoeError::NoActiveShoe),
        };

        let logged = self.entries[start..]
            .iter()
            .filter_map(LogEntry::as_round)
            .filter(|r| r.shoe_id == shoe_id)
            .count();

        let round = Round {
            player_hand: Some(hands.player),
            banker_hand: Some(hands.banker),
            outcome,
            shoe_id,
            round_index: logged as u32 + 1,
        };
        debug!("Recording round {} of {}: {}", round.round_index, round.shoe_id, outcome);
        self.push(LogEntry::Round(round.clone()));

        Ok(round)
    }

    pub fn end_shoe(&mut self) -> Result<ShoeId, ShoeError> {
        let shoe_id = self
            .shoe_state()
            .active_shoe()
            .cloned()
            .ok_or(ShoeError::NoActiveShoeToEnd)?;

        self.push(LogEntry::Event(ShoeEvent::end(shoe_id.clone())));
        info!("Ended {}", shoe_id);
        Ok(shoe_id)
    }

    fn push(&mut self, entry: LogEntry) {
        if let Some(number) = entry.shoe_id().number() {
            self.highest_shoe_number = self.highest_shoe_number.max(number);
        }
        self.entries.push(entry);
    }
}
