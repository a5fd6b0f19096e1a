//! # gw-latency-tester - GPIO Loopback Latency Measurement
//!
//! Measures the round-trip latency of an optical (or electrical) loopback
//! fixture wired to four GPIO lines: the tester raises an emitter, hard-polls
//! a receiver until it reacts, and timestamps the interval with
//! `CLOCK_MONOTONIC_RAW`. Repeated cycles are folded into min, max, jitter and
//! an exponential moving average.
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────────┐
//!  │                    TestRun (controller)                   │
//!  │  Idle → Configuring → Running(i) → TearingDown → Done     │
//!  └───────┬───────────────────┬──────────────────┬────────────┘
//!          │ setup/teardown    │ each cycle       │ polled
//!          ▼                   ▼                  ▼
//!  ┌───────────────┐   ┌───────────────┐   ┌───────────────────┐
//!  │   LineGroup   │◀──│ LatencyProbe  │   │ TerminationToken  │
//!  │ power emitter │   │  spin / time  │   │ (SIGINT/QUIT/TERM)│
//!  │ status recv   │   └──────┬────────┘   └───────────────────┘
//!  └──────┬────────┘          │ Sample
//!         │ GpioChip          ▼
//!         ▼            ┌───────────────┐   ┌───────────────────┐
//!  ┌───────────────┐   │ RunStatistics │──▶│     Reporter      │
//!  │ sysfs backend │   │ min/max/EWMA  │   │  text / JSON lines│
//!  └───────────────┘   └───────────────┘   └───────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`gpio`]: line capability traits, the sysfs backend, [`gpio::DigitalLine`]
//!   and [`gpio::LineGroup`]
//! - [`measurement`]: monotonic clock, probe cycle and streaming statistics
//! - [`controller`]: the run state machine
//! - [`termination`]: signal handlers feeding a cancellation token
//! - [`report`]: per-cycle and summary output
//! - [`cli`], [`config`]: argument parsing and validated run parameters
//! - [`preflight`]: environment checks before any line is exported
//! - [`domain`]: newtypes and error types
//!
//! ## Fail-safe Lines
//!
//! Every line is left as an output driven low when the tester exits, whether
//! it finishes, fails, or is interrupted. Teardown is idempotent and also runs
//! when a [`gpio::LineGroup`] is dropped.

pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod gpio;
pub mod measurement;
pub mod preflight;
pub mod report;
pub mod termination;
