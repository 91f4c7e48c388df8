use std::collections::VecDeque;
use std::io::{BufRead, Cursor};

use crate::engine::PerformanceStats;
use crate::generator::{EXHAUSTED_LINE, SourceError, WordSource, finish_line};

/// Reads a text corpus and packs its words into lines.
///
/// Words are pulled lazily from the reader. One word of look-ahead is kept
/// between calls: it is the first word of the next line and its presence is
/// what `has_next` reports.
pub struct TextLines {
    reader: Option<Box<dyn BufRead>>,
    pending: VecDeque<String>,
    lookahead: Option<String>,
}

impl TextLines {
    pub fn new(reader: Box<dyn BufRead>) -> Result<Self, SourceError> {
        let mut lines = Self {
            reader: Some(reader),
            pending: VecDeque::new(),
            lookahead: None,
        };
        lines.lookahead = lines.next_word();
        if lines.lookahead.is_none() {
            lines.stop();
            return Err(SourceError::other("text contains no words"));
        }
        Ok(lines)
    }

    pub fn from_text(text: impl Into<String>) -> Result<Self, SourceError> {
        Self::new(Box::new(Cursor::new(text.into())))
    }

    fn next_word(&mut self) -> Option<String> {
        loop {
            if let Some(word) = self.pending.pop_front() {
                return Some(word);
            }
            let reader = self.reader.as_mut()?;
            let mut buf = String::new();
            match reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => self
                    .pending
                    .extend(buf.split_whitespace().map(str::to_string)),
                Err(e) => {
                    log::warn!("Stopped reading text early: {e}");
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}

/// Split an over-long word so the head fits into `max_len` chars.
///
/// An existing hyphen inside the bounds is preferred as the cut; otherwise a
/// hyphen is inserted after `max_len - 1` chars.
pub fn force_split(word: &str, max_len: usize) -> (String, String) {
    let chars: Vec<char> = word.chars().collect();
    if max_len < 2 {
        let head: String = chars[..max_len.min(chars.len())].iter().collect();
        let tail: String = chars[max_len.min(chars.len())..].iter().collect();
        return (head, tail);
    }
    let existing = chars[..max_len.min(chars.len())]
        .iter()
        .rposition(|&ch| ch == '-')
        .filter(|&pos| pos > 0 && pos + 1 < chars.len());
    match existing {
        Some(pos) => (
            chars[..=pos].iter().collect(),
            chars[pos + 1..].iter().collect(),
        ),
        None => {
            let cut = max_len - 1;
            let mut head: String = chars[..cut].iter().collect();
            head.push('-');
            (head, chars[cut..].iter().collect())
        }
    }
}

impl WordSource for TextLines {
    fn create(&mut self, max_len: usize, _stats: &PerformanceStats) -> String {
        if self.lookahead.is_none() || max_len == 0 {
            return EXHAUSTED_LINE.to_string();
        }

        let mut line = String::with_capacity(max_len + 1);
        let mut used = 0usize;
        while let Some(word) = self.lookahead.take() {
            let word_len = word.chars().count();
            let needed = if used == 0 { word_len } else { word_len + 1 };
            if used + needed <= max_len {
                if used > 0 {
                    line.push(' ');
                }
                line.push_str(&word);
                used += needed;
                self.lookahead = self.next_word();
            } else if used == 0 {
                let (head, tail) = force_split(&word, max_len);
                line.push_str(&head);
                self.lookahead = Some(tail);
                break;
            } else {
                self.lookahead = Some(word);
                break;
            }
        }

        finish_line(line)
    }

    fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    fn stop(&mut self) {
        if self.reader.take().is_some() {
            log::debug!("Closed text reader");
        }
        self.pending.clear();
    }
}

impl Drop for TextLines {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::assert_line_contract;

    fn lines(text: &str) -> TextLines {
        TextLines::from_text(text).unwrap()
    }

    #[test]
    fn test_packs_words_across_source_lines() {
        let stats = PerformanceStats::new();
        let mut src = lines("Example text,\n some example text.");
        assert_eq!(src.create(20, &stats), "Example text, some\n");
        assert!(src.has_next());
        assert_eq!(src.create(20, &stats), "example text.\n");
        assert!(!src.has_next());
        src.stop();
    }

    #[test]
    fn test_empty_text_is_an_init_error() {
        let err = TextLines::from_text("  \n\t ").err().unwrap();
        assert!(!err.is_missing_resource());
    }

    #[test]
    fn test_long_word_gets_inserted_hyphen() {
        let stats = PerformanceStats::new();
        let mut src = lines("abcdefghij end");
        assert_eq!(src.create(6, &stats), "abcde-\n");
        assert_eq!(src.create(6, &stats), "fghij\n");
        assert_eq!(src.create(6, &stats), "end\n");
        assert!(!src.has_next());
    }

    #[test]
    fn test_long_word_prefers_existing_hyphen() {
        let stats = PerformanceStats::new();
        let mut src = lines("well-known-thing");
        assert_eq!(src.create(12, &stats), "well-known-\n");
        assert_eq!(src.create(12, &stats), "thing\n");
    }

    #[test]
    fn test_force_split_bounds() {
        assert_eq!(force_split("abcdef", 4), ("abc-".into(), "def".into()));
        assert_eq!(force_split("ab-cdef", 4), ("ab-".into(), "cdef".into()));
        // Hyphen beyond the cut is ignored.
        assert_eq!(force_split("abcde-f", 4), ("abc-".into(), "de-f".into()));
        // Leading hyphen would make no progress on the word itself.
        assert_eq!(force_split("-abcdef", 4), ("-ab-".into(), "cdef".into()));
        assert_eq!(force_split("abc", 1), ("a".into(), "bc".into()));
    }

    #[test]
    fn test_exhausted_source_returns_sentinel() {
        let stats = PerformanceStats::new();
        let mut src = lines("one two");
        assert_eq!(src.create(30, &stats), "one two\n");
        assert!(!src.has_next());
        assert_eq!(src.create(30, &stats), EXHAUSTED_LINE);
        assert_eq!(src.create(30, &stats), EXHAUSTED_LINE);
    }

    #[test]
    fn test_has_next_false_after_exact_line_count() {
        let stats = PerformanceStats::new();
        let text = "aaa bbb ccc ddd eee fff";
        let mut src = lines(text);
        let mut count = 0;
        while src.has_next() {
            let line = src.create(7, &stats);
            assert_line_contract(&line, 7);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut src = lines("a b c");
        src.stop();
        src.stop();
        // Look-ahead survives the reader being closed.
        assert!(src.has_next());
    }

    #[test]
    fn test_contract_holds_for_narrow_lines() {
        let stats = PerformanceStats::new();
        for max_len in 1..12 {
            let mut src = lines("supercalifragilistic is a very-long-hyphenated word");
            let mut guard = 0;
            while src.has_next() && guard < 200 {
                assert_line_contract(&src.create(max_len, &stats), max_len);
                guard += 1;
            }
            assert!(!src.has_next(), "max_len {max_len} did not finish");
        }
    }
}
