use rand::Rng;
use rand::rngs::SmallRng;

use crate::engine::PerformanceStats;
use crate::generator::pool::CharPool;
use crate::generator::{PoolSource, SourceError, WordSource, finish_line};

/// Word lengths sampled uniformly by index; short words dominate.
pub const RIGHT_SKEWED_LENGTHS: &[usize] = &[
    1, 2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 7, 7, 8, 9, 10,
];

/// Turns a pool into one word of an exact length.
pub trait WordShape {
    fn word(&mut self, pool: &CharPool, len: usize, rng: &mut SmallRng) -> String;
}

/// Every character drawn independently from the pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformWords;

impl WordShape for UniformWords {
    fn word(&mut self, pool: &CharPool, len: usize, rng: &mut SmallRng) -> String {
        (0..len).filter_map(|_| pool.pick(rng)).collect()
    }
}

/// Lines of generated words separated by single spaces.
pub struct RandomLines<W: WordShape> {
    pool: CharPool,
    lengths: &'static [usize],
    shape: W,
    rng: SmallRng,
}

impl RandomLines<UniformWords> {
    pub fn uniform(pool: CharPool, rng: SmallRng) -> Result<Self, SourceError> {
        Self::new(pool, UniformWords, rng)
    }
}

impl<W: WordShape> RandomLines<W> {
    pub fn new(pool: CharPool, shape: W, rng: SmallRng) -> Result<Self, SourceError> {
        if pool.is_empty() {
            return Err(SourceError::other("character pool is empty"));
        }
        Ok(Self {
            pool,
            lengths: RIGHT_SKEWED_LENGTHS,
            shape,
            rng,
        })
    }

    pub fn with_lengths(mut self, lengths: &'static [usize]) -> Self {
        if !lengths.is_empty() {
            self.lengths = lengths;
        }
        self
    }
}

impl<W: WordShape> WordSource for RandomLines<W> {
    fn create(&mut self, max_len: usize, _stats: &PerformanceStats) -> String {
        let pool = self.pool.clone();
        self.create_from_pool(&pool, max_len)
    }
}

impl<W: WordShape> PoolSource for RandomLines<W> {
    fn pool(&self) -> &CharPool {
        &self.pool
    }

    fn create_from_pool(&mut self, pool: &CharPool, max_len: usize) -> String {
        let mut line = String::with_capacity(max_len + 1);
        // Budget counts the separator that follows every word.
        let mut remaining = max_len;
        while remaining > 0 {
            let word_len = self.lengths[self.rng.gen_range(0..self.lengths.len())];
            if word_len > remaining {
                break;
            }
            remaining = remaining.saturating_sub(word_len + 1);
            line.push_str(&self.shape.word(pool, word_len, &mut self.rng));
            line.push(' ');
        }
        finish_line(line)
    }
}
