use crate::engine::PerformanceStats;

/// Outcome of validating one keystroke against the active line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keystroke {
    pub expected: Option<char>,
    pub typed: char,
    pub correct: bool,
    /// The keystroke was the correct terminating newline.
    pub line_completed: bool,
}

/// The line being typed and the position within it.
#[derive(Clone, Debug, Default)]
pub struct LineMonitor {
    line: Vec<char>,
    cursor: usize,
}

impl LineMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_line(&mut self, line: &str) {
        self.line = line.chars().collect();
        self.cursor = 0;
    }

    pub fn line(&self) -> String {
        self.line.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `None` once the cursor sits past the last char of the line.
    pub fn current_char(&self) -> Option<char> {
        self.line.get(self.cursor).copied()
    }

    pub fn typed_part(&self) -> String {
        self.line[..self.cursor].iter().collect()
    }

    pub fn remaining_part(&self) -> String {
        self.line[self.cursor..].iter().collect()
    }

    /// Validate `typed` and record the result in `stats`.
    ///
    /// A hit is keyed by the expected char and moves the cursor on, except
    /// for the terminating newline which completes the line instead. A miss
    /// is keyed by the expected char too, tallies the typed char as wrong and
    /// leaves the cursor in place.
    pub fn advance_if_correct(&mut self, typed: char, stats: &mut PerformanceStats) -> Keystroke {
        let expected = self.current_char();
        let correct = expected == Some(typed);

        let mut line_completed = false;
        if correct {
            stats.add_hit(typed);
            if typed == '\n' {
                line_completed = true;
            } else {
                self.cursor += 1;
            }
        } else {
            if let Some(expected) = expected {
                stats.add_error(expected);
            }
            stats.add_wrong_typed(typed);
        }

        Keystroke {
            expected,
            typed,
            correct,
            line_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(line: &str) -> LineMonitor {
        let mut m = LineMonitor::new();
        m.set_line(line);
        m
    }

    #[test]
    fn test_correct_chars_advance() {
        let mut m = monitor("ab\n");
        let mut stats = PerformanceStats::new();
        let k = m.advance_if_correct('a', &mut stats);
        assert!(k.correct);
        assert!(!k.line_completed);
        assert_eq!(m.cursor(), 1);
        assert_eq!(m.current_char(), Some('b'));
        assert_eq!(m.typed_part(), "a");
        assert_eq!(m.remaining_part(), "b\n");
    }

    #[test]
    fn test_wrong_char_keeps_cursor() {
        let mut m = monitor("ab\n");
        let mut stats = PerformanceStats::new();
        let k = m.advance_if_correct('x', &mut stats);
        assert!(!k.correct);
        assert_eq!(k.expected, Some('a'));
        assert_eq!(m.cursor(), 0);
        assert_eq!(stats.rate('a').unwrap().errors, 1);
        assert!(stats.rate('x').is_none());
        assert_eq!(stats.wrong_typed().collect::<Vec<_>>(), vec![('x', 1)]);
    }

    #[test]
    fn test_newline_completes_line_without_moving() {
        let mut m = monitor("a\n");
        let mut stats = PerformanceStats::new();
        m.advance_if_correct('a', &mut stats);
        let k = m.advance_if_correct('\n', &mut stats);
        assert!(k.correct);
        assert!(k.line_completed);
        assert_eq!(m.cursor(), 1);
        assert_eq!(stats.rate('\n').unwrap().hits, 1);
    }

    #[test]
    fn test_end_of_line_sentinel() {
        let mut m = monitor("a");
        let mut stats = PerformanceStats::new();
        m.advance_if_correct('a', &mut stats);
        assert_eq!(m.current_char(), None);
        let k = m.advance_if_correct('a', &mut stats);
        assert!(!k.correct);
        assert_eq!(k.expected, None);
        assert!(m.cursor() <= 1);
    }
}
