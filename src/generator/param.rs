//! `key=value;` encoding of strategy parameters.
//!
//! Keys and values may contain neither delimiter; there is no escaping.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::generator::SourceError;

pub const PAIR_DELIMITER: char = ';';
pub const KEY_VALUE_DELIMITER: char = '=';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("delimiter in key `{0}`")]
    DelimiterInKey(String),
    #[error("delimiter in value `{0}`")]
    DelimiterInValue(String),
    #[error("malformed pair `{0}` (expected key=value)")]
    MalformedPair(String),
}

impl From<ParamError> for SourceError {
    fn from(err: ParamError) -> Self {
        SourceError::other(format!("invalid strategy parameter: {err}"))
    }
}

fn has_delimiter(s: &str) -> bool {
    s.contains(PAIR_DELIMITER) || s.contains(KEY_VALUE_DELIMITER)
}

pub fn encode(map: &BTreeMap<String, String>) -> Result<String, ParamError> {
    let mut out = String::new();
    for (key, value) in map {
        if has_delimiter(key) {
            return Err(ParamError::DelimiterInKey(key.clone()));
        }
        if has_delimiter(value) {
            return Err(ParamError::DelimiterInValue(value.clone()));
        }
        out.push_str(key);
        out.push(KEY_VALUE_DELIMITER);
        out.push_str(value);
        out.push(PAIR_DELIMITER);
    }
    Ok(out)
}

pub fn decode(s: &str) -> Result<BTreeMap<String, String>, ParamError> {
    let mut map = BTreeMap::new();
    for pair in s.split(PAIR_DELIMITER).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once(KEY_VALUE_DELIMITER)
            .ok_or_else(|| ParamError::MalformedPair(pair.to_string()))?;
        if value.contains(KEY_VALUE_DELIMITER) {
            return Err(ParamError::MalformedPair(pair.to_string()));
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Decoded strategy parameter with typed accessors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategyParams {
    values: BTreeMap<String, String>,
}

impl StrategyParams {
    pub fn parse(s: &str) -> Result<Self, ParamError> {
        Ok(Self { values: decode(s)? })
    }

    pub fn encode(&self) -> Result<String, ParamError> {
        encode(&self.values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, SourceError> {
        self.get(key)
            .ok_or_else(|| SourceError::other(format!("strategy parameter `{key}` is missing")))
    }

    /// Absent or unparsable flags read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn number(&self, key: &str) -> Result<Option<usize>, SourceError> {
        self.get(key)
            .map(|v| {
                v.parse::<usize>().map_err(|_| {
                    SourceError::other(format!("strategy parameter `{key}` is not a number: {v}"))
                })
            })
            .transpose()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Entries from `defaults` that this param does not set itself.
    pub fn with_defaults(mut self, defaults: &StrategyParams) -> Self {
        for (k, v) in &defaults.values {
            self.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            map(&[]),
            map(&[("is_local", "true"), ("file_name", "fox.txt")]),
            map(&[("", "")]),
            map(&[("chars", "asdf jklö"), ("empty", "")]),
        ];
        for m in cases {
            let encoded = encode(&m).unwrap();
            assert_eq!(decode(&encoded).unwrap(), m, "encoded as {encoded:?}");
        }
    }

    #[test]
    fn test_encode_rejects_delimiters() {
        assert_eq!(
            encode(&map(&[("a;b", "c")])),
            Err(ParamError::DelimiterInKey("a;b".into()))
        );
        assert_eq!(
            encode(&map(&[("a", "b=c")])),
            Err(ParamError::DelimiterInValue("b=c".into()))
        );
    }

    #[test]
    fn test_decode_rejects_malformed_pairs() {
        assert!(matches!(decode("novalue;"), Err(ParamError::MalformedPair(_))));
        assert!(matches!(decode("a=b=c"), Err(ParamError::MalformedPair(_))));
    }

    #[test]
    fn test_decode_tolerates_missing_trailing_delimiter() {
        assert_eq!(decode("a=1;b=2").unwrap(), map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_typed_accessors() {
        let params = StrategyParams::parse("is_local=TRUE;file_name=x.txt;chars=400;").unwrap();
        assert!(params.flag("is_local"));
        assert!(!params.flag("missing"));
        assert_eq!(params.require("file_name").unwrap(), "x.txt");
        assert!(params.require("nope").is_err());
        assert_eq!(params.number("chars").unwrap(), Some(400));
        assert_eq!(params.number("nope").unwrap(), None);
        assert!(params.clone().with_defaults(&StrategyParams::parse("chars=9;lang=en").unwrap()).get("lang") == Some("en"));
    }

    #[test]
    fn test_defaults_do_not_override() {
        let params = StrategyParams::parse("chars=abc").unwrap();
        let defaults = StrategyParams::parse("chars=xyz;lang=de").unwrap();
        let merged = params.with_defaults(&defaults);
        assert_eq!(merged.get("chars"), Some("abc"));
        assert_eq!(merged.get("lang"), Some("de"));
    }
}
