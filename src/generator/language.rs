use rand::Rng;
use rand::rngs::SmallRng;

use crate::generator::SourceError;
use crate::generator::pool::CharPool;
use crate::generator::random::{RandomLines, WordShape};

const CAPITALIZE_PROB: f64 = 0.40;
const WORD_END_MARK_PROB: f64 = 0.35;
const SENTENCE_END_SHARE: f64 = 0.60;

/// Pseudo words with language-like capitalization and punctuation.
///
/// Carries whether the next word starts a sentence across calls, so a line
/// that ended with `.` begins the next line capitalized.
#[derive(Clone, Debug)]
pub struct LanguageWords {
    sentence_start: bool,
}

impl LanguageWords {
    /// The pool must offer lowercase and uppercase letters and at least one
    /// sentence mark (`.`, `!` or `?`).
    pub fn for_pool(pool: &CharPool) -> Result<Self, SourceError> {
        if pool.lowercase().is_empty()
            || pool.uppercase().is_empty()
            || pool.sentence_marks().is_empty()
        {
            return Err(SourceError::other(
                "character set needs lowercase letters, uppercase letters and one of '.', '!', '?'",
            ));
        }
        Ok(Self {
            sentence_start: true,
        })
    }

    pub fn at_sentence_start(&self) -> bool {
        self.sentence_start
    }
}

impl WordShape for LanguageWords {
    fn word(&mut self, pool: &CharPool, len: usize, rng: &mut SmallRng) -> String {
        if len == 0 {
            return String::new();
        }
        let lower = pool.lowercase();
        let upper = pool.uppercase();
        let clause = pool.clause_marks();
        let sentence = pool.sentence_marks();

        let mut word = String::with_capacity(len);

        let first = if self.sentence_start || rng.gen_bool(CAPITALIZE_PROB) {
            self.sentence_start = false;
            upper.pick(rng)
        } else {
            lower.pick(rng)
        };
        word.extend(first);

        for _ in 1..len.saturating_sub(1) {
            word.extend(lower.pick(rng));
        }

        if len >= 2 {
            let last = if rng.gen_bool(WORD_END_MARK_PROB) {
                if clause.is_empty() || rng.gen_bool(SENTENCE_END_SHARE) {
                    self.sentence_start = true;
                    sentence.pick(rng)
                } else {
                    clause.pick(rng)
                }
            } else {
                lower.pick(rng)
            };
            word.extend(last);
        }

        word
    }
}

pub fn language_lines(pool: CharPool, rng: SmallRng) -> Result<RandomLines<LanguageWords>, SourceError> {
    let shape = LanguageWords::for_pool(&pool)?;
    RandomLines::new(pool, shape, rng)
}
