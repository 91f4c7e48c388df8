pub mod performance;

pub use performance::{PerformanceRate, PerformanceStats};
