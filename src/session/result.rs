use serde::{Deserialize, Serialize};

use crate::engine::PerformanceRate;

/// Outcome of a regularly stopped session, handed to the store once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub exercise_id: u32,
    pub totals: PerformanceRate,
    pub required_time_ms: u64,
}

impl SessionResult {
    /// Correct characters per minute.
    pub fn cpm(&self) -> f64 {
        if self.required_time_ms < 100 {
            return 0.0;
        }
        self.totals.hits as f64 / (self.required_time_ms as f64 / 60_000.0)
    }

    pub fn wpm(&self) -> f64 {
        self.cpm() / 5.0
    }

    pub fn accuracy(&self) -> f64 {
        if self.totals.total() == 0 {
            return 100.0;
        }
        self.totals.hit_rate() * 100.0
    }
}
