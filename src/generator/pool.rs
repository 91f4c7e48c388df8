use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::SmallRng;

pub const CLAUSE_MARKS: &[char] = &[',', ';', ':', '-'];
pub const SENTENCE_MARKS: &[char] = &['.', '!', '?'];

/// A multiset of characters. A character appearing `n` times is `n` times as
/// likely to be drawn as one appearing once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharPool {
    chars: Vec<char>,
}

impl CharPool {
    pub fn new(chars: Vec<char>) -> Self {
        Self { chars }
    }

    /// Whitespace is never part of a pool; words are separated by the line
    /// layout, not by drawn characters.
    pub fn from_chars(chars: &str) -> Self {
        Self::new(chars.chars().filter(|ch| !ch.is_whitespace()).collect())
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn push_n(&mut self, ch: char, count: usize) {
        self.chars.extend(std::iter::repeat_n(ch, count));
    }

    pub fn count(&self, ch: char) -> usize {
        self.chars.iter().filter(|&&c| c == ch).count()
    }

    /// Distinct characters in first-appearance order.
    pub fn distinct(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for &ch in &self.chars {
            if !seen.contains(&ch) {
                seen.push(ch);
            }
        }
        seen
    }

    pub fn pick(&self, rng: &mut SmallRng) -> Option<char> {
        if self.chars.is_empty() {
            return None;
        }
        Some(self.chars[rng.gen_range(0..self.chars.len())])
    }

    pub fn filtered(&self, keep: impl Fn(char) -> bool) -> CharPool {
        CharPool::new(self.chars.iter().copied().filter(|&ch| keep(ch)).collect())
    }

    pub fn lowercase(&self) -> CharPool {
        self.filtered(char::is_lowercase)
    }

    pub fn uppercase(&self) -> CharPool {
        self.filtered(char::is_uppercase)
    }

    pub fn clause_marks(&self) -> CharPool {
        self.filtered(|ch| CLAUSE_MARKS.contains(&ch))
    }

    pub fn sentence_marks(&self) -> CharPool {
        self.filtered(|ch| SENTENCE_MARKS.contains(&ch))
    }

    pub fn histogram(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for &ch in &self.chars {
            *counts.entry(ch).or_insert(0) += 1;
        }
        counts
    }
}
