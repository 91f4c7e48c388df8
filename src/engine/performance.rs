use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hit/error counter pair for one character or for a whole session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRate {
    pub hits: u32,
    pub errors: u32,
}

impl PerformanceRate {
    pub fn new(hits: u32, errors: u32) -> Self {
        Self { hits, errors }
    }

    pub fn add_hit(&mut self) {
        self.hits += 1;
    }

    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.errors
    }

    pub fn error_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.errors as f64 / total as f64
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

impl fmt::Display for PerformanceRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[hits={};errors={}]", self.hits, self.errors)
    }
}

/// Per-character and total performance of one practice session.
///
/// Rates are keyed by the character the typist was *supposed* to type. The
/// wrong-typed tally records what was actually pressed instead and is kept for
/// diagnostics only; it never feeds into scoring or adaptation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    per_char: BTreeMap<char, PerformanceRate>,
    total: PerformanceRate,
    wrong_typed: BTreeMap<char, u32>,
}

impl PerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hit(&mut self, expected: char) {
        self.total.add_hit();
        self.per_char.entry(expected).or_default().add_hit();
    }

    pub fn add_error(&mut self, expected: char) {
        self.total.add_error();
        self.per_char.entry(expected).or_default().add_error();
    }

    pub fn add_wrong_typed(&mut self, typed: char) {
        *self.wrong_typed.entry(typed).or_insert(0) += 1;
    }

    pub fn total(&self) -> PerformanceRate {
        self.total
    }

    pub fn rate(&self, ch: char) -> Option<PerformanceRate> {
        self.per_char.get(&ch).copied()
    }

    pub fn error_rate(&self, ch: char) -> f64 {
        self.rate(ch).map(|r| r.error_rate()).unwrap_or(0.0)
    }

    /// Characters seen so far with their rates, in character order.
    pub fn iter(&self) -> impl Iterator<Item = (char, PerformanceRate)> + '_ {
        self.per_char.iter().map(|(&ch, &rate)| (ch, rate))
    }

    pub fn wrong_typed(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.wrong_typed.iter().map(|(&ch, &count)| (ch, count))
    }

    pub fn is_empty(&self) -> bool {
        self.total.total() == 0
    }

    /// Characters ordered by descending error rate, ties broken by character.
    pub fn weakest(&self, limit: usize) -> Vec<(char, PerformanceRate)> {
        let mut rows: Vec<(char, PerformanceRate)> =
            self.iter().filter(|(_, r)| r.errors > 0).collect();
        rows.sort_by(|a, b| {
            b.1.error_rate()
                .partial_cmp(&a.1.error_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        rows.truncate(limit);
        rows
    }
}
