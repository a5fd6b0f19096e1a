//! GPIO line access
//!
//! - [`GpioChip`] / [`LineHandle`]: the capability a GPIO backend must offer
//! - `sysfs`: the Linux `/sys/class/gpio` backend
//! - `line`: one [`DigitalLine`] with fail-safe close
//! - `group`: the four-line [`LineGroup`] with all-or-nothing setup

pub mod group;
pub mod line;
pub mod sysfs;

use std::os::unix::io::RawFd;

use crate::domain::{Direction, Level, LineId, ResourceError};

pub use group::{LineAssignment, LineGroup};
pub use line::DigitalLine;
pub use sysfs::{SysfsChip, SysfsLine, DEFAULT_SYSFS_ROOT};

/// A bank of GPIO lines that can be exported and opened
pub trait GpioChip {
    type Handle: LineHandle;

    /// Make `line` available to userspace. Succeeds without doing anything
    /// if the line is already exported.
    fn export(&self, line: LineId) -> Result<(), ResourceError>;

    /// Hand `line` back to the kernel
    fn unexport(&self, line: LineId) -> Result<(), ResourceError>;

    /// Open the direction and value handles of an exported line. Dropping the
    /// returned handle closes both.
    fn open(&self, line: LineId) -> Result<Self::Handle, ResourceError>;
}

/// Open direction/value handles of one line
pub trait LineHandle {
    fn set_direction(&mut self, direction: Direction) -> Result<(), ResourceError>;

    fn write_value(&mut self, level: Level) -> Result<(), ResourceError>;

    fn read_value(&mut self) -> Result<Level, ResourceError>;

    /// Raw (direction, value) descriptors, for backends that have them
    fn raw_fds(&self) -> Option<(RawFd, RawFd)> {
        None
    }
}
