use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Vote {
    Up,
    #[default]
    None,
    Down,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::None => 0,
            Vote::Down => -1,
        }
    }

    pub fn from_likes(likes: Option<bool>) -> Self {
        match likes {
            Some(true) => Vote::Up,
            Some(false) => Vote::Down,
            None => Vote::None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Vote::Up => "▲",
            Vote::Down => "▼",
            Vote::None => "·",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct VoteEntry {
    original: Vote,
    current: Vote,
}

/// Optimistic vote state, keyed by node id and kept beside the thread tree.
///
/// Scores in the tree stay as the service reported them; the ledger supplies
/// the adjustment at render time.
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    entries: HashMap<String, VoteEntry>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the vote the service says the user already cast.
    pub fn record_original(&mut self, id: &str, vote: Vote) {
        self.entries.insert(
            id.to_string(),
            VoteEntry {
                original: vote,
                current: vote,
            },
        );
    }

    /// Apply a vote request; repeating the current direction clears it.
    /// Returns the resulting vote.
    pub fn toggle(&mut self, id: &str, requested: Vote) -> Vote {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.current = if entry.current == requested {
            Vote::None
        } else {
            requested
        };
        entry.current
    }

    /// Roll a node back to its original vote, e.g. after the request failed.
    pub fn revert(&mut self, id: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.current = entry.original;
        }
    }

    pub fn current(&self, id: &str) -> Vote {
        self.entries
            .get(id)
            .map(|entry| entry.current)
            .unwrap_or_default()
    }

    pub fn adjusted_score(&self, id: &str, base: i64) -> i64 {
        match self.entries.get(id) {
            Some(entry) => base + entry.current.value() - entry.original.value(),
            None => base,
        }
    }

    pub fn marker(&self, id: &str) -> &'static str {
        self.current(id).marker()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
