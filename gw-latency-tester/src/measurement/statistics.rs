//! Streaming latency statistics
//!
//! Tracks min, max and an exponentially weighted moving average with O(1)
//! memory. Samples are not retained.

use crate::domain::{ConfigError, Sample};

/// Running statistics over the samples of one test run
///
/// The moving average starts at zero rather than at the first sample, so the
/// first few readings are pulled towards zero. With `alpha` close to 1 the
/// transient is negligible.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    count: u64,
    min: f64,
    max: f64,
    ewma: f64,
    alpha: f64,
}

impl RunStatistics {
    /// # Errors
    /// Returns `ConfigError::AlphaOutOfRange` unless `0 < alpha <= 1`
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::AlphaOutOfRange(alpha));
        }
        Ok(Self { count: 0, min: f64::INFINITY, max: 0.0, ewma: 0.0, alpha })
    }

    pub fn update(&mut self, sample: Sample) {
        let s = sample.as_seconds();
        self.min = self.min.min(s);
        self.max = self.max.max(s);
        self.ewma = self.alpha * s + (1.0 - self.alpha) * self.ewma;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Smallest sample so far; `+inf` before the first
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample so far; `0` before the first
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn ewma(&self) -> f64 {
        self.ewma
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Spread between the slowest and fastest sample
    pub fn jitter(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_initial_state() {
        let stats = RunStatistics::new(0.1).unwrap();
        assert_eq!(stats.count(), 0);
        assert!(stats.min().is_infinite());
        assert!(close(stats.max(), 0.0));
        assert!(close(stats.ewma(), 0.0));
        assert!(close(stats.jitter(), 0.0));
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(RunStatistics::new(1.0).is_ok());
        assert!(RunStatistics::new(1e-9).is_ok());
        assert!(matches!(RunStatistics::new(0.0), Err(ConfigError::AlphaOutOfRange(_))));
        assert!(RunStatistics::new(1.5).is_err());
        assert!(RunStatistics::new(-0.2).is_err());
        assert!(RunStatistics::new(f64::NAN).is_err());
    }

    #[test]
    fn test_bounds_hold_after_every_update() {
        let samples = [0.0031, 0.0007, 0.0122, 0.0009, 0.0045, 0.0007, 0.03, 0.000_001];
        let mut stats = RunStatistics::new(0.3).unwrap();
        for (i, s) in samples.iter().enumerate() {
            stats.update(Sample(*s));
            for seen in &samples[..=i] {
                assert!(stats.min() <= *seen && *seen <= stats.max());
            }
            assert!(stats.jitter() >= 0.0);
        }
        assert!(close(stats.min(), 0.000_001));
        assert!(close(stats.max(), 0.03));
    }

    #[test]
    fn test_alpha_one_tracks_latest_sample() {
        let mut stats = RunStatistics::new(1.0).unwrap();
        for s in [0.004, 0.001, 0.009, 0.002] {
            stats.update(Sample(s));
            assert!(close(stats.ewma(), s));
        }
    }

    #[test]
    fn test_constant_stream_converges_geometrically() {
        let alpha = 0.05;
        let s = 0.002;
        let mut stats = RunStatistics::new(alpha).unwrap();
        for k in 1..=50 {
            stats.update(Sample(s));
            let expected = s * (1.0 - (1.0_f64 - alpha).powi(k));
            assert!(close(stats.ewma(), expected), "k={k}: {} != {expected}", stats.ewma());
        }
    }

    #[test]
    fn test_three_sample_trace() {
        let mut stats = RunStatistics::new(0.5).unwrap();
        let mut trace = Vec::new();
        for s in [0.002, 0.004, 0.003] {
            stats.update(Sample(s));
            trace.push(stats.ewma());
        }

        assert_eq!(stats.count(), 3);
        assert!(close(stats.min(), 0.002));
        assert!(close(stats.max(), 0.004));
        assert!(close(stats.jitter(), 0.002));
        assert!(close(trace[0], 0.001));
        assert!(close(trace[1], 0.0025));
        assert!(close(trace[2], 0.00275));
    }
}
