//! Validated, immutable run parameters

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Args;
use crate::domain::{ConfigError, LineId};
use crate::gpio::{LineAssignment, DEFAULT_SYSFS_ROOT};

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Everything a run needs, fixed before the first line is touched
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub lines: LineAssignment,
    pub loop_count: u32,
    pub inter_cycle_delay: Duration,
    pub alpha: f64,
    /// Wait between powering the receiver and the first cycle
    pub settle_time: Duration,
    pub sysfs_root: PathBuf,
    pub format: OutputFormat,
    /// Skip per-cycle output
    pub quiet: bool,
}

impl RunConfig {
    /// Config with the command-line defaults for the given lines
    pub fn new(lines: LineAssignment) -> Self {
        Self {
            lines,
            loop_count: 1,
            inter_cycle_delay: Duration::from_micros(500_000),
            alpha: 0.1,
            settle_time: Duration::from_secs(1),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            format: OutputFormat::Text,
            quiet: false,
        }
    }

    /// # Errors
    /// Returns the first invalid parameter found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_count == 0 {
            return Err(ConfigError::ZeroLoopCount);
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::AlphaOutOfRange(self.alpha));
        }
        self.lines.validate()
    }
}

impl TryFrom<&Args> for RunConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let lines = LineAssignment::new(
            LineId(args.power),
            LineId(args.emitter),
            LineId(args.status),
            LineId(args.receiver),
        );
        let config = Self {
            lines,
            loop_count: args.count,
            inter_cycle_delay: Duration::from_micros(args.delay_us),
            alpha: args.alpha,
            settle_time: Duration::from_millis(args.settle_ms),
            sysfs_root: args.sysfs_root.clone(),
            format: if args.json { OutputFormat::Json } else { OutputFormat::Text },
            quiet: args.quiet,
        };
        config.validate()?;
        Ok(config)
    }
}
