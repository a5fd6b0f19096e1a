//! Command-line interface for gw-latency-tester
//!
//! This module contains CLI argument parsing and configuration

pub mod args;

pub use args::Args;
