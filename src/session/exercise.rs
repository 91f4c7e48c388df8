use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitType {
    #[default]
    None,
    Chars,
    Time,
}

/// What to practise and when to stop. Selected by the host; a session keeps
/// its own copy and never changes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDescriptor {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub group_id: u32,
    pub strategy_key: String,
    #[serde(default)]
    pub strategy_param: String,
    #[serde(default)]
    pub limit_type: LimitType,
    #[serde(default)]
    pub limit_units: u32,
}

impl ExerciseDescriptor {
    pub fn new(id: u32, name: impl Into<String>, strategy_key: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            group_id: 0,
            strategy_key: strategy_key.into(),
            strategy_param: String::new(),
            limit_type: LimitType::None,
            limit_units: 0,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.strategy_param = param.into();
        self
    }

    pub fn with_limit(mut self, limit_type: LimitType, limit_units: u32) -> Self {
        self.limit_type = limit_type;
        self.limit_units = limit_units;
        self
    }

    pub fn char_limit(&self) -> Option<u32> {
        (self.limit_type == LimitType::Chars).then_some(self.limit_units)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.limit_type == LimitType::Time).then(|| Duration::from_secs(self.limit_units.into()))
    }
}
