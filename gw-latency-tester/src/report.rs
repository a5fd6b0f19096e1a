//! Run output
//!
//! Text output follows the classic tester layout with nine decimal places.
//! JSON output emits one object per line, tagged by `event`.

use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

use crate::config::OutputFormat;
use crate::domain::{Sample, Signal};
use crate::measurement::RunStatistics;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record {
    Start { clock_resolution_s: f64 },
    Sample { cycle: u64, seconds: f64 },
    Summary(Summary),
}

/// Final figures of a run in serializable form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub runs: u64,
    pub max_s: f64,
    pub min_s: f64,
    pub jitter_s: f64,
    pub ewma_s: f64,
    pub alpha: f64,
    /// Set when the run was cut short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_by: Option<String>,
}

impl Summary {
    pub fn new(stats: &RunStatistics, terminated: Option<Signal>) -> Self {
        Self {
            runs: stats.count(),
            max_s: stats.max(),
            min_s: stats.min(),
            jitter_s: stats.jitter(),
            ewma_s: stats.ewma(),
            alpha: stats.alpha(),
            terminated_by: terminated.map(|s| s.to_string()),
        }
    }
}

/// Writes run progress and results
pub struct Reporter<W> {
    out: W,
    format: OutputFormat,
    quiet: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat, quiet: bool) -> Self {
        Self { out, format, quiet }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn record(&mut self, record: &Record) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Clock resolution and start banner
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn start(&mut self, clock_resolution: Duration) -> io::Result<()> {
        let resolution = clock_resolution.as_secs_f64();
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "System Clock Resolution: {resolution:.9}s")?;
                writeln!(self.out, "=== Starting Test ===")?;
                self.out.flush()
            }
            OutputFormat::Json => self.record(&Record::Start { clock_resolution_s: resolution }),
        }
    }

    /// One measured cycle, numbered from 1
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn sample(&mut self, cycle: u64, sample: Sample) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "Running time difference: {sample}")?;
                self.out.flush()
            }
            OutputFormat::Json => {
                self.record(&Record::Sample { cycle, seconds: sample.as_seconds() })
            }
        }
    }

    /// Summary block; nothing is written for a run without samples
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn summary(&mut self, stats: &RunStatistics, terminated: Option<Signal>) -> io::Result<()> {
        if stats.is_empty() {
            return Ok(());
        }
        let summary = Summary::new(stats, terminated);

        match self.format {
            OutputFormat::Text => {
                let plural = if summary.runs == 1 { "" } else { "s" };
                writeln!(self.out, "=== Summary ===")?;
                if let Some(signal) = &summary.terminated_by {
                    writeln!(self.out, "Interrupted by {signal}")?;
                }
                writeln!(self.out, "Ran {} time{plural}", summary.runs)?;
                writeln!(self.out, "Max Latency: {:.9}s", summary.max_s)?;
                writeln!(self.out, "Min Latency: {:.9}s", summary.min_s)?;
                writeln!(self.out, "Max Jitter : {:.9}s", summary.jitter_s)?;
                writeln!(
                    self.out,
                    "Exponential Moving Average (alpha={:.1}): {:.9}s",
                    summary.alpha, summary.ewma_s
                )?;
                self.out.flush()
            }
            OutputFormat::Json => self.record(&Record::Summary(summary)),
        }
    }
}
