//! One emitter-to-receiver round trip
//!
//! The receiver reads `1` while the fixture is quiescent and drops to `0`
//! once light from the emitter reaches the sensor. A cycle waits for the
//! quiescent level, timestamps, raises the emitter, waits for the drop and
//! timestamps again.
//!
//! Both waits are hard spin loops without sleep, yield or timeout. An
//! unresponsive receiver hangs the cycle until a termination request arrives.

use super::MonotonicClock;
use crate::domain::{Level, ResourceError, Role, Sample, Signal};
use crate::gpio::{GpioChip, LineGroup};
use crate::termination::TerminationToken;

/// Result of a probe cycle that did not fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Measured(Sample),
    /// Termination was requested while waiting on the receiver
    Interrupted(Signal),
}

/// Drives the emitter and times the receiver's response
pub struct LatencyProbe<'a, K> {
    clock: &'a K,
    token: &'a TerminationToken,
}

impl<'a, K: MonotonicClock> LatencyProbe<'a, K> {
    pub fn new(clock: &'a K, token: &'a TerminationToken) -> Self {
        Self { clock, token }
    }

    /// Run one measurement cycle on a configured group
    ///
    /// # Errors
    /// Returns an error if the emitter cannot be driven
    pub fn run_cycle<C: GpioChip>(
        &self,
        group: &mut LineGroup<C>,
        cycle: u64,
    ) -> Result<CycleOutcome, ResourceError> {
        // Let the system normalize
        if let Some(signal) = self.spin_until(group, Level::High) {
            return Ok(CycleOutcome::Interrupted(signal));
        }

        let start = self.clock.now();
        group.set_value(Role::Emitter, Level::High)?;

        // Light present on the sensor pulls the receiver low
        if let Some(signal) = self.spin_until(group, Level::Low) {
            log::debug!("Cycle {cycle} interrupted with emitter raised");
            return Ok(CycleOutcome::Interrupted(signal));
        }
        let end = self.clock.now();

        group.set_value(Role::Emitter, Level::Low)?;

        let sample = end.since(start);
        log::debug!("Cycle {cycle}: {sample}");
        Ok(CycleOutcome::Measured(sample))
    }

    fn spin_until<C: GpioChip>(&self, group: &mut LineGroup<C>, level: Level) -> Option<Signal> {
        while group.read_value(Role::Receiver) != level {
            if let Some(signal) = self.token.requested() {
                return Some(signal);
            }
        }
        None
    }
}
