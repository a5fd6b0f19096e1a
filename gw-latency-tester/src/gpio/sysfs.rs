//! Linux sysfs GPIO backend
//!
//! Drives lines through `/sys/class/gpio`:
//! - `export` / `unexport`: write the GPIO number
//! - `gpioN/direction`: `in` or `out`
//! - `gpioN/value`: `0` or `1`
//!
//! Attribute files are opened once with `O_SYNC` and rewound to offset 0
//! before every access, so each read observes the current pin state.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use super::{GpioChip, LineHandle};
use crate::domain::{Direction, Level, LineId, ResourceError};

/// Standard mount point of the sysfs GPIO class
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// GPIO bank exposed through sysfs
#[derive(Debug, Clone)]
pub struct SysfsChip {
    root: PathBuf,
}

impl SysfsChip {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory sysfs creates for an exported line
    pub fn line_dir(&self, line: LineId) -> PathBuf {
        self.root.join(format!("gpio{}", line.0))
    }

    fn write_control(&self, file: &str, line: LineId) -> std::io::Result<()> {
        let mut control = OpenOptions::new().write(true).open(self.root.join(file))?;
        control.write_all(line.0.to_string().as_bytes())
    }

    fn open_attribute(&self, line: LineId, attribute: &'static str) -> Result<File, ResourceError> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(self.line_dir(line).join(attribute))
            .map_err(|source| ResourceError::Open { line, attribute, source })
    }
}

impl GpioChip for SysfsChip {
    type Handle = SysfsLine;

    fn export(&self, line: LineId) -> Result<(), ResourceError> {
        if self.line_dir(line).is_dir() {
            log::debug!("{line} already exported");
            return Ok(());
        }

        log::info!("Exporting {line}");
        self.write_control("export", line).map_err(|source| ResourceError::Export { line, source })
    }

    fn unexport(&self, line: LineId) -> Result<(), ResourceError> {
        log::info!("Unexporting {line}");
        self.write_control("unexport", line)
            .map_err(|source| ResourceError::Unexport { line, source })
    }

    fn open(&self, line: LineId) -> Result<SysfsLine, ResourceError> {
        let value = self.open_attribute(line, "value")?;
        let direction = self.open_attribute(line, "direction")?;
        Ok(SysfsLine { line, value, direction })
    }
}

/// Open `value` and `direction` attributes of one exported line
#[derive(Debug)]
pub struct SysfsLine {
    line: LineId,
    value: File,
    direction: File,
}

fn rewrite(file: &mut File, text: &str) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(text.as_bytes())
}

impl LineHandle for SysfsLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), ResourceError> {
        rewrite(&mut self.direction, direction.as_str()).map_err(|source| {
            ResourceError::WriteDirection { line: self.line, direction, source }
        })
    }

    fn write_value(&mut self, level: Level) -> Result<(), ResourceError> {
        rewrite(&mut self.value, level.as_str())
            .map_err(|source| ResourceError::WriteValue { line: self.line, level, source })
    }

    fn read_value(&mut self) -> Result<Level, ResourceError> {
        let line = self.line;
        let mut byte = [0u8; 1];
        self.value
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.value.read_exact(&mut byte))
            .map_err(|source| ResourceError::Read { line, source })?;

        Level::from_byte(byte[0]).ok_or(ResourceError::InvalidValue { line, byte: byte[0] })
    }

    fn raw_fds(&self) -> Option<(RawFd, RawFd)> {
        Some((self.direction.as_raw_fd(), self.value.as_raw_fd()))
    }
}
