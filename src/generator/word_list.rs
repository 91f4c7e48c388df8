use std::io::BufRead;

use rand::Rng;
use rand::rngs::SmallRng;

use crate::engine::PerformanceStats;
use crate::generator::{SourceError, WordSource, finish_line};

/// Lines of words drawn at random from a fixed list. Never runs dry.
pub struct WordList {
    words: Vec<String>,
    rng: SmallRng,
}

impl WordList {
    pub fn new(words: Vec<String>, rng: SmallRng) -> Result<Self, SourceError> {
        let words: Vec<String> = words
            .into_iter()
            .flat_map(|w| {
                w.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        if words.is_empty() {
            return Err(SourceError::other("word list is empty"));
        }
        Ok(Self { words, rng })
    }

    pub fn from_reader(reader: impl BufRead, rng: SmallRng) -> Result<Self, SourceError> {
        let words = reader
            .lines()
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| SourceError::other(format!("failed to read word list: {e}")))?;
        Self::new(words, rng)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSource for WordList {
    fn create(&mut self, max_len: usize, _stats: &PerformanceStats) -> String {
        let mut line = String::with_capacity(max_len + 1);
        let mut remaining = max_len;
        while remaining > 0 {
            let word = &self.words[self.rng.gen_range(0..self.words.len())];
            let word_len = word.chars().count();
            if word_len > remaining {
                break;
            }
            line.push_str(word);
            line.push(' ');
            remaining = remaining.saturating_sub(word_len + 1);
        }
        finish_line(line)
    }
}
