use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::PerformanceRate;
use crate::session::SessionResult;

pub const SCHEMA_VERSION: u32 = 1;

/// One finished session as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub exercise_id: u32,
    pub totals: PerformanceRate,
    pub required_time_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(result: &SessionResult, finished_at: DateTime<Utc>) -> Self {
        Self {
            exercise_id: result.exercise_id,
            totals: result.totals,
            required_time_ms: result.required_time_ms,
            finished_at,
        }
    }

    pub fn result(&self) -> SessionResult {
        SessionResult {
            exercise_id: self.exercise_id,
            totals: self.totals,
            required_time_ms: self.required_time_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionHistoryData {
    pub schema_version: u32,
    pub sessions: Vec<SessionRecord>,
}

impl Default for SessionHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl SessionHistoryData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
