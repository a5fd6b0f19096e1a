//! Test run sequencing
//!
//! ```text
//! Idle ──▶ Configuring ──▶ Running(1..=N) ──▶ TearingDown ──▶ Done
//!               │                 │                ▲
//!               │ setup failed    └── terminated ──┘
//!               └──────────────────────────────────────────▶ Done
//! ```
//!
//! Once the lines are configured every exit path, including a termination
//! request or a fatal write error, passes through `TearingDown`, which
//! releases the line group exactly once. A request that arrives during
//! teardown is still reported.

use std::io::Write;

use crate::config::RunConfig;
use crate::domain::{Level, Role, RunError, Signal};
use crate::gpio::{GpioChip, LineGroup};
use crate::measurement::{CycleOutcome, LatencyProbe, MonotonicClock, RunStatistics};
use crate::report::Reporter;
use crate::termination::{ForcedRelease, TerminationToken};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Configuring,
    /// Executing the given cycle, numbered from 1
    Running { cycle: u64 },
    TearingDown,
    Done,
}

/// Outcome of a run that did not fail
#[derive(Debug, Clone)]
pub struct RunReport {
    pub statistics: RunStatistics,
    /// Signal that cut the run short
    pub terminated: Option<Signal>,
}

/// One latency test: setup, probe cycles, teardown, summary
pub struct TestRun<'a, K, W> {
    config: &'a RunConfig,
    clock: &'a K,
    token: &'a TerminationToken,
    reporter: Reporter<W>,
    state: RunState,
}

impl<'a, K: MonotonicClock, W: Write> TestRun<'a, K, W> {
    pub fn new(config: &'a RunConfig, clock: &'a K, token: &'a TerminationToken, out: W) -> Self {
        Self {
            config,
            clock,
            token,
            reporter: Reporter::new(out, config.format, config.quiet),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Output sink, for inspecting what the run printed
    pub fn into_output(self) -> W {
        self.reporter.into_inner()
    }

    fn enter(&mut self, next: RunState) {
        match next {
            RunState::Running { cycle } => log::debug!("state: running cycle {cycle}"),
            other => log::info!("state: {:?} -> {other:?}", self.state),
        }
        self.state = next;
    }

    /// Run the whole test against `chip`
    ///
    /// # Errors
    /// Returns `RunError::Resource` if the lines cannot be set up or driven,
    /// and `RunError::Output` if the report cannot be written. Lines acquired
    /// before the failure are released either way.
    pub fn execute<C: GpioChip>(&mut self, chip: C) -> Result<RunReport, RunError> {
        let mut statistics = RunStatistics::new(self.config.alpha)?;

        if let Some(signal) = self.token.requested() {
            log::info!("{signal} received before setup, nothing to release");
            self.enter(RunState::Done);
            return Ok(RunReport { statistics, terminated: Some(signal) });
        }

        self.enter(RunState::Configuring);
        let mut group = match LineGroup::setup(chip, &self.config.lines) {
            Ok(group) => group,
            Err(e) => {
                self.enter(RunState::Done);
                return Err(e.into());
            }
        };

        let forced = ForcedRelease::arm(group.raw_fds());
        let outcome = self.exercise(&mut group, &mut statistics);

        self.enter(RunState::TearingDown);
        // Descriptors close in release_all
        drop(forced);
        if let Err(e) = group.set_value(Role::Status, Level::Low) {
            log::warn!("Failed to clear status LED: {e}");
        }
        group.release_all();

        let terminated = match outcome {
            Ok(terminated) => terminated.or_else(|| self.token.requested()),
            Err(e) => {
                if let Err(report_err) = self.reporter.summary(&statistics, None) {
                    log::warn!("{report_err}");
                }
                self.enter(RunState::Done);
                return Err(e);
            }
        };

        if let Some(signal) = terminated {
            log::info!("Run terminated by {signal} after {} samples", statistics.count());
        }
        let summary = self.reporter.summary(&statistics, terminated);
        self.enter(RunState::Done);
        summary?;

        Ok(RunReport { statistics, terminated })
    }

    /// Everything between setup and teardown. Returns the signal if the
    /// run was terminated.
    fn exercise<C: GpioChip>(
        &mut self,
        group: &mut LineGroup<C>,
        statistics: &mut RunStatistics,
    ) -> Result<Option<Signal>, RunError> {
        self.reporter.start(self.clock.resolution())?;

        group.set_value(Role::Status, Level::High)?;
        // Power low keeps the receiver on
        group.set_value(Role::Power, Level::Low)?;

        // Give the receiver time to reach a known state
        if let Some(signal) = self.token.sleep(self.config.settle_time) {
            return Ok(Some(signal));
        }

        let probe = LatencyProbe::new(self.clock, self.token);
        for cycle in 1..=u64::from(self.config.loop_count) {
            if let Some(signal) = self.token.requested() {
                return Ok(Some(signal));
            }
            self.enter(RunState::Running { cycle });

            match probe.run_cycle(group, cycle)? {
                CycleOutcome::Measured(sample) => {
                    statistics.update(sample);
                    self.reporter.sample(cycle, sample)?;
                }
                CycleOutcome::Interrupted(signal) => return Ok(Some(signal)),
            }

            if let Some(signal) = self.token.sleep(self.config.inter_cycle_delay) {
                return Ok(Some(signal));
            }
        }

        Ok(None)
    }
}
