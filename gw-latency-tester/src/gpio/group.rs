//! The four lines of the loopback fixture, managed as one unit
//!
//! A [`LineGroup`] only exists fully configured: [`LineGroup::setup`] either
//! returns a group whose lines are all open (receiver as input, the rest
//! driven low) or releases whatever it acquired and fails.

use std::os::unix::io::RawFd;

use super::{DigitalLine, GpioChip};
use crate::domain::{ConfigError, Direction, Level, LineId, ResourceError, Role, LINE_COUNT};

/// GPIO number for each role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAssignment {
    lines: [LineId; LINE_COUNT],
}

impl LineAssignment {
    pub fn new(power: LineId, emitter: LineId, status: LineId, receiver: LineId) -> Self {
        Self { lines: [power, emitter, status, receiver] }
    }

    pub fn get(&self, role: Role) -> LineId {
        self.lines[role.index()]
    }

    /// Reject assignments that put two roles on the same GPIO
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateLine` naming the first clash found
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, first) in Role::ALL.iter().enumerate() {
            for second in &Role::ALL[i + 1..] {
                if self.get(*first) == self.get(*second) {
                    return Err(ConfigError::DuplicateLine {
                        line: self.get(*first),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Power, emitter, status and receiver lines with a shared lifecycle
pub struct LineGroup<C: GpioChip> {
    chip: C,
    lines: [DigitalLine<C::Handle>; LINE_COUNT],
    released: bool,
}

impl<C: GpioChip> LineGroup<C> {
    /// Export, open and configure all four lines
    ///
    /// Exports are best-effort. Every line is then opened as an output driven
    /// low, and the receiver is switched to input.
    ///
    /// # Errors
    /// Returns the first open/direction/value failure. Lines opened before
    /// the failure are closed and unexported first.
    pub fn setup(chip: C, assignment: &LineAssignment) -> Result<Self, ResourceError> {
        let lines = Role::ALL.map(|role| DigitalLine::new(assignment.get(role), role));
        let mut group = Self { chip, lines, released: false };

        for line in &mut group.lines {
            line.export(&group.chip);
        }

        if let Err(e) = group.configure() {
            log::warn!("Line setup failed, releasing lines: {e}");
            group.release_all();
            return Err(e);
        }

        log::info!(
            "Lines ready: power={} emitter={} status={} receiver={}",
            assignment.get(Role::Power),
            assignment.get(Role::Emitter),
            assignment.get(Role::Status),
            assignment.get(Role::Receiver)
        );
        Ok(group)
    }

    fn configure(&mut self) -> Result<(), ResourceError> {
        for line in &mut self.lines {
            line.open(&self.chip)?;
            line.set_direction(Direction::Output)?;
            line.set_value(Level::Low)?;
        }
        self.line_mut(Role::Receiver).set_direction(Direction::Input)
    }

    pub fn line(&self, role: Role) -> &DigitalLine<C::Handle> {
        &self.lines[role.index()]
    }

    pub fn line_mut(&mut self, role: Role) -> &mut DigitalLine<C::Handle> {
        &mut self.lines[role.index()]
    }

    /// Drive an output line
    ///
    /// # Errors
    /// Returns an error if the write fails or the group was released
    pub fn set_value(&mut self, role: Role, level: Level) -> Result<(), ResourceError> {
        self.line_mut(role).set_value(level)
    }

    /// Poll a line; see [`DigitalLine::read_value`]
    pub fn read_value(&mut self, role: Role) -> Level {
        self.line_mut(role).read_value()
    }

    /// Descriptors of every open line that exposes them
    pub fn raw_fds(&self) -> Vec<(RawFd, RawFd)> {
        self.lines.iter().filter_map(DigitalLine::raw_fds).collect()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Put every line into its safe state and give it back to the kernel
    ///
    /// Fans out over all four lines regardless of individual failures.
    /// Returns `false` if the group had already been released, in which case
    /// nothing is touched.
    pub fn release_all(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        for line in &mut self.lines {
            line.close(&self.chip);
        }
        log::info!("All lines released");
        true
    }
}

impl<C: GpioChip> Drop for LineGroup<C> {
    fn drop(&mut self) {
        self.release_all();
    }
}
