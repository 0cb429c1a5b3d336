//! Bounded ranked collection of leaderboard entries
//!
//! The board keeps at most `capacity` entries sorted by descending score.
//! Every entry receives a sequence number when it is appended, and ties are
//! broken by that number so that an earlier submission always outranks a later
//! one with the same score, no matter how many times the board was re-sorted
//! or truncated in between.

use shared::Entry;

/// An entry together with the sequence number it was appended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub seq: u64,
    pub entry: Entry,
}

/// Sorted, truncated set of entries
///
/// The board is a plain value: the store mutates a clone and only swaps it in
/// once the new contents are durable.
#[derive(Debug, Clone)]
pub struct Board {
    entries: Vec<RankedEntry>,
    next_seq: u64,
    capacity: usize,
}

impl Board {
    /// Creates an empty board that keeps at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
            capacity: capacity.max(1),
        }
    }

    /// Rebuilds a board from entries in persisted rank order
    ///
    /// Sequence numbers are reassigned in the given order, so ties keep the
    /// relative order they were stored in. Oversized input is ranked and then
    /// cut down to capacity.
    pub fn from_ranked(entries: Vec<Entry>, capacity: usize) -> Self {
        let mut board = Self::new(capacity);
        for entry in entries {
            board.append(entry);
        }
        board.rank();
        board
    }

    /// Appends an entry and restores the ranking invariants
    ///
    /// Returns the 1-based rank the entry ended up at, or `None` if it was
    /// truncated off the end of the board.
    pub fn insert(&mut self, entry: Entry) -> Option<usize> {
        let seq = self.append(entry);
        self.rank();
        self.entries
            .iter()
            .position(|ranked| ranked.seq == seq)
            .map(|index| index + 1)
    }

    fn append(&mut self, entry: Entry) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(RankedEntry { seq, entry });
        seq
    }

    fn rank(&mut self) {
        self.entries.sort_by(|a, b| {
            b.entry
                .score
                .cmp(&a.entry.score)
                .then_with(|| a.seq.cmp(&b.seq))
        });
        self.entries.truncate(self.capacity);
    }

    /// Checks whether a score submitted now would make the board
    pub fn qualifies(&self, score: i64) -> bool {
        self.potential_rank(score).is_some()
    }

    /// The 1-based rank a score submitted now would reach, if any
    ///
    /// A new entry ranks below every existing entry with an equal or higher
    /// score.
    pub fn potential_rank(&self, score: i64) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|ranked| score > ranked.entry.score)
            .unwrap_or(self.entries.len())
            + 1;
        (rank <= self.capacity).then_some(rank)
    }

    /// Copies the ranked entries out in rank order
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.iter().map(|ranked| ranked.entry.clone()).collect()
    }

    pub fn ranked(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn top_score(&self) -> Option<i64> {
        self.entries.first().map(|ranked| ranked.entry.score)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
