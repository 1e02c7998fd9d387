//! Per-participant score breakdown for one ranking.

pub mod aggregator;
pub mod cache;

pub use aggregator::BreakdownService;
pub use cache::{BreakdownCache, MemoryCache};

use serde::Serialize;
use std::collections::BTreeMap;

/// Summed match sub-score counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub full: i64,
    pub toto: i64,
    pub goal_bonus: i64,
    pub goal_diff: i64,
}

/// Bonus-question tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuestionTally {
    pub correct: i64,
    pub points: i64,
}

/// A participant may have match rows, question rows, or both; a missing part
/// reads as zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<QuestionTally>,
}

/// Participant id -> entry, iterated in ascending participant id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Breakdown {
    entries: BTreeMap<i64, BreakdownEntry>,
}

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> Option<&BreakdownEntry> {
        self.entries.get(&user_id)
    }

    pub fn set_matches(&mut self, user_id: i64, counts: MatchCounts) {
        self.entries.entry(user_id).or_default().matches = Some(counts);
    }

    pub fn set_questions(&mut self, user_id: i64, tally: QuestionTally) {
        self.entries.entry(user_id).or_default().questions = Some(tally);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &BreakdownEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }
}
