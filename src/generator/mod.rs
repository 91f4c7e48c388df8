pub mod adaptive;
pub mod language;
pub mod param;
pub mod pool;
pub mod random;
pub mod registry;
pub mod remote;
pub mod text;
pub mod typeable;
pub mod word_list;

use std::fmt;

use thiserror::Error;

use crate::engine::PerformanceStats;
use crate::generator::pool::CharPool;

/// Returned by finite sources once their content is used up.
pub const EXHAUSTED_LINE: &str = "\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitErrorKind {
    MissingResource,
    Other,
}

impl fmt::Display for InitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitErrorKind::MissingResource => f.write_str("missing resource"),
            InitErrorKind::Other => f.write_str("initialization failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{kind}: {detail}")]
    Init { kind: InitErrorKind, detail: String },
    #[error("no word source registered for `{0}`")]
    NotFound(String),
}

impl SourceError {
    pub fn missing(detail: impl Into<String>) -> Self {
        SourceError::Init {
            kind: InitErrorKind::MissingResource,
            detail: detail.into(),
        }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        SourceError::Init {
            kind: InitErrorKind::Other,
            detail: detail.into(),
        }
    }

    pub fn is_missing_resource(&self) -> bool {
        matches!(
            self,
            SourceError::Init {
                kind: InitErrorKind::MissingResource,
                ..
            }
        )
    }
}

/// A pluggable producer of practice lines.
///
/// `create` returns at most `max_len` printable chars followed by a single
/// `'\n'`; the char before the newline is never a space. `stats` are the live
/// statistics of the running session for sources that adapt to the typist.
pub trait WordSource {
    fn create(&mut self, max_len: usize, stats: &PerformanceStats) -> String;

    /// `false` once no further full line can be produced.
    fn has_next(&self) -> bool {
        true
    }

    /// Release held resources. Must be safe to call more than once.
    fn stop(&mut self) {}
}

/// A source that draws its characters from a weighted pool, so decorators can
/// rewrite the pool before generation.
pub trait PoolSource: WordSource {
    fn pool(&self) -> &CharPool;

    fn create_from_pool(&mut self, pool: &CharPool, max_len: usize) -> String;
}

impl<S: WordSource + ?Sized> WordSource for Box<S> {
    fn create(&mut self, max_len: usize, stats: &PerformanceStats) -> String {
        (**self).create(max_len, stats)
    }

    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Trim trailing spaces and terminate with a newline.
pub(crate) fn finish_line(mut line: String) -> String {
    let trimmed = line.trim_end_matches(' ').len();
    line.truncate(trimmed);
    line.push('\n');
    line
}

/// Checks the line contract shared by every source. Used by tests.
#[cfg(test)]
pub(crate) fn assert_line_contract(line: &str, max_len: usize) {
    let chars: Vec<char> = line.chars().collect();
    assert!(
        chars.len() <= max_len + 1,
        "line {line:?} longer than {} chars",
        max_len + 1
    );
    assert_eq!(chars.last(), Some(&'\n'), "line {line:?} must end with newline");
    assert!(
        !chars[..chars.len() - 1].contains(&'\n'),
        "line {line:?} has an inner newline"
    );
    if chars.len() > 1 {
        assert_ne!(chars[chars.len() - 2], ' ', "line {line:?} has trailing space");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_line_trims_trailing_space() {
        assert_eq!(finish_line("ab cd ".to_string()), "ab cd\n");
        assert_eq!(finish_line(String::new()), "\n");
        assert_eq!(finish_line("  ".to_string()), "\n");
    }

    #[test]
    fn test_missing_resource_is_distinguishable() {
        assert!(SourceError::missing("words.txt").is_missing_resource());
        assert!(!SourceError::other("bad").is_missing_resource());
        assert!(!SourceError::NotFound("x".into()).is_missing_resource());
        assert_eq!(
            SourceError::missing("words.txt").to_string(),
            "missing resource: words.txt"
        );
    }
}
