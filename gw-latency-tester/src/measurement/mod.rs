//! Latency measurement
//!
//! - `clock`: monotonic timestamps
//! - `probe`: one emitter/receiver round trip
//! - `statistics`: min/max/jitter/EWMA over a run

pub mod clock;
pub mod probe;
pub mod statistics;

pub use clock::{MonotonicClock, RawMonotonicClock};
pub use probe::{CycleOutcome, LatencyProbe};
pub use statistics::RunStatistics;
