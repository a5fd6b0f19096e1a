//! # gw-latency-tester - Main Entry Point
//!
//! Parses the line assignment, checks the sysfs GPIO interface, installs the
//! termination handlers and runs the test. When interrupted, the signal is
//! re-raised with its default action after teardown, falling back to exit
//! status `128 + signal`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io;

use gw_latency_tester::cli::Args;
use gw_latency_tester::config::RunConfig;
use gw_latency_tester::controller::TestRun;
use gw_latency_tester::domain::{ConfigError, RunError, Signal};
use gw_latency_tester::gpio::SysfsChip;
use gw_latency_tester::measurement::RawMonotonicClock;
use gw_latency_tester::preflight::run_preflight_checks;
use gw_latency_tester::termination::{install_signal_handlers, reraise, TerminationToken};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 1;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            use clap::error::ErrorKind;
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            // Ignore a failed write to stderr; the exit status still reports usage
            let _ = e.print();
            std::process::exit(EXIT_USAGE);
        }
    };

    std::process::exit(match run(&args) {
        Ok(None) => EXIT_SUCCESS,
        Ok(Some(signal)) => {
            reraise(signal);
            signal.exit_code()
        }
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            if code == EXIT_USAGE && e.downcast_ref::<ConfigError>().is_some() {
                eprintln!("\n{}", Args::command().render_usage());
            }
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_USAGE;
    }
    match err.downcast_ref::<RunError>() {
        Some(RunError::Config(_)) => EXIT_USAGE,
        Some(RunError::Resource(e)) if e.is_permission_denied() => EXIT_NOPERM,
        _ => EXIT_ERROR,
    }
}

/// Returns the terminating signal if the run was interrupted
fn run(args: &Args) -> Result<Option<Signal>> {
    let config = RunConfig::try_from(args)?;

    run_preflight_checks(&config.sysfs_root, config.quiet)?;

    let token = TerminationToken::new();
    install_signal_handlers(&token).context("Failed to install termination handlers")?;

    let clock = RawMonotonicClock;
    let chip = SysfsChip::new(&config.sysfs_root);
    let mut test_run = TestRun::new(&config, &clock, &token, io::stdout().lock());
    let report = test_run.execute(chip)?;

    Ok(report.terminated.or_else(|| token.requested()))
}
