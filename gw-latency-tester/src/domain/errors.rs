//! Structured error types for gw-latency-tester
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{Direction, Level, LineId, Role};
use std::io;
use thiserror::Error;

/// Invalid run parameters. Raised before any hardware is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("alpha must be in (0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("loop count must be at least 1")]
    ZeroLoopCount,

    #[error("{line} is assigned to both {first} and {second}")]
    DuplicateLine { line: LineId, first: Role, second: Role },
}

/// Failure to obtain or drive a GPIO line
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to export {line}: {source}")]
    Export { line: LineId, source: io::Error },

    #[error("Failed to unexport {line}: {source}")]
    Unexport { line: LineId, source: io::Error },

    #[error("Failed to open {attribute} of {line}: {source}")]
    Open { line: LineId, attribute: &'static str, source: io::Error },

    #[error("Failed to set {line} direction to {direction}: {source}")]
    WriteDirection { line: LineId, direction: Direction, source: io::Error },

    #[error("Failed to drive {line} to {level}: {source}")]
    WriteValue { line: LineId, level: Level, source: io::Error },

    #[error("Failed to read value of {line}: {source}")]
    Read { line: LineId, source: io::Error },

    #[error("Unexpected value byte {byte:#04x} from {line}")]
    InvalidValue { line: LineId, byte: u8 },

    #[error("{0} is not open")]
    NotOpen(LineId),
}

impl ResourceError {
    /// Underlying OS error, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ResourceError::Export { source, .. }
            | ResourceError::Unexport { source, .. }
            | ResourceError::Open { source, .. }
            | ResourceError::WriteDirection { source, .. }
            | ResourceError::WriteValue { source, .. }
            | ResourceError::Read { source, .. } => Some(source),
            ResourceError::InvalidValue { .. } | ResourceError::NotOpen(_) => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        self.io_error().is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
    }
}

/// Fatal outcome of a latency run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),
}
