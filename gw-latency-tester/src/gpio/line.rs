//! A single GPIO line and its lifecycle

use std::os::unix::io::RawFd;

use super::{GpioChip, LineHandle};
use crate::domain::{Direction, Level, LineId, ResourceError, Role};

/// One line of the fixture
///
/// Holds its handles only between a successful [`open`](Self::open) and
/// [`close`](Self::close). Reads that fail while polling are absorbed here:
/// the last good level is returned instead.
#[derive(Debug)]
pub struct DigitalLine<H> {
    id: LineId,
    role: Role,
    handle: Option<H>,
    exported: bool,
    last_level: Level,
    read_errors: u64,
}

impl<H: LineHandle> DigitalLine<H> {
    pub fn new(id: LineId, role: Role) -> Self {
        Self { id, role, handle: None, exported: false, last_level: Level::Low, read_errors: 0 }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Raw (direction, value) descriptors while open
    pub fn raw_fds(&self) -> Option<(RawFd, RawFd)> {
        self.handle.as_ref().and_then(LineHandle::raw_fds)
    }

    /// Number of failed reads absorbed since the line was created
    pub fn read_errors(&self) -> u64 {
        self.read_errors
    }

    /// Ask the chip to export this line. Failure is logged, not returned:
    /// the line may already be claimed for userspace.
    pub fn export<C: GpioChip<Handle = H>>(&mut self, chip: &C) {
        if let Err(e) = chip.export(self.id) {
            log::warn!("{} ({}): {e}", self.id, self.role);
        }
        self.exported = true;
    }

    /// Open direction and value handles
    ///
    /// # Errors
    /// Returns `ResourceError::Open` if either attribute cannot be opened
    pub fn open<C: GpioChip<Handle = H>>(&mut self, chip: &C) -> Result<(), ResourceError> {
        if self.handle.is_none() {
            self.handle = Some(chip.open(self.id)?);
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut H, ResourceError> {
        self.handle.as_mut().ok_or(ResourceError::NotOpen(self.id))
    }

    /// # Errors
    /// Returns an error if the line is not open or the write fails
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), ResourceError> {
        log::debug!("{} ({}) direction {direction}", self.id, self.role);
        self.handle()?.set_direction(direction)
    }

    /// # Errors
    /// Returns an error if the line is not open or the write fails
    pub fn set_value(&mut self, level: Level) -> Result<(), ResourceError> {
        self.handle()?.write_value(level)
    }

    /// Current input level
    ///
    /// Never fails: a read error is logged and the previous level (low before
    /// the first good read) is returned so a spin-wait keeps polling.
    pub fn read_value(&mut self) -> Level {
        let result = match self.handle.as_mut() {
            Some(handle) => handle.read_value(),
            None => Err(ResourceError::NotOpen(self.id)),
        };

        match result {
            Ok(level) => {
                self.last_level = level;
                level
            }
            Err(e) => {
                self.read_errors += 1;
                // First failure is worth seeing; a persistent one would flood stderr
                if self.read_errors == 1 {
                    log::warn!("{} ({}): {e}, keeping last level", self.id, self.role);
                } else {
                    log::trace!("{} ({}): {e}", self.id, self.role);
                }
                self.last_level
            }
        }
    }

    /// Fail-safe release: output, driven low, handles closed, unexported
    ///
    /// Every step is attempted even if an earlier one fails. Calling this on a
    /// line that is already closed does nothing.
    pub fn close<C: GpioChip<Handle = H>>(&mut self, chip: &C) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.set_direction(Direction::Output) {
                log::warn!("{} ({}): {e}", self.id, self.role);
            }
            if let Err(e) = handle.write_value(Level::Low) {
                log::warn!("{} ({}): {e}", self.id, self.role);
            }
            drop(handle);
        }

        if self.exported {
            self.exported = false;
            if let Err(e) = chip.unexport(self.id) {
                log::warn!("{} ({}): {e}", self.id, self.role);
            }
        }
    }
}
