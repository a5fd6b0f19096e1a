//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep GPIO numbers, logic levels and clock readings
//! from being mixed up with plain integers.

use std::fmt;

/// Number of lines a latency test drives
pub const LINE_COUNT: usize = 4;

/// Kernel GPIO number
///
/// The number written to `/sys/class/gpio/export`, not a physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Role a line plays in the loopback fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Receiver supply; held low to keep the receiver powered
    Power,
    /// Light emitter the probe toggles
    Emitter,
    /// Status LED, high while a test is running
    Status,
    /// Sensor input the probe polls
    Receiver,
}

impl Role {
    /// All roles in assignment order
    pub const ALL: [Role; LINE_COUNT] = [Role::Power, Role::Emitter, Role::Status, Role::Receiver];

    /// Position of this role in a line group
    pub fn index(self) -> usize {
        match self {
            Role::Power => 0,
            Role::Emitter => 1,
            Role::Status => 2,
            Role::Receiver => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Power => "power",
            Role::Emitter => "emitter",
            Role::Status => "status",
            Role::Receiver => "receiver",
        };
        f.write_str(name)
    }
}

/// Line direction as understood by the sysfs `direction` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Attribute text for this direction
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logic level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Parse the first byte of a sysfs `value` attribute
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Level::Low),
            b'1' => Some(Level::High),
            _ => None,
        }
    }

    /// Attribute text for this level
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic clock reading in nanoseconds
///
/// Not related to wall-clock time; only differences between two readings of
/// the same clock are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Build from a `timespec`-style pair
    pub fn from_parts(secs: u64, nanos: u32) -> Self {
        Timestamp(secs.saturating_mul(1_000_000_000).saturating_add(u64::from(nanos)))
    }

    /// Elapsed time from `start` to `self`
    ///
    /// The difference is taken on integer nanoseconds and converted to
    /// floating point once. A reading earlier than `start` yields zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn since(self, start: Timestamp) -> Sample {
        let nanos = self.0.saturating_sub(start.0);
        Sample(nanos as f64 / 1_000_000_000.0)
    }
}

impl fmt::Display for Timestamp {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.0 as f64 / 1_000_000_000.0)
    }
}

/// One measured round-trip latency, in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Sample(pub f64);

impl Sample {
    pub fn as_seconds(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.0)
    }
}

/// Termination signal number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal(pub i32);

impl Signal {
    pub const INT: Signal = Signal(libc::SIGINT);
    pub const QUIT: Signal = Signal(libc::SIGQUIT);
    pub const TERM: Signal = Signal(libc::SIGTERM);

    /// Shell convention for a process ended by this signal
    pub fn exit_code(self) -> i32 {
        128 + self.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Signal::INT => f.write_str("SIGINT"),
            Signal::QUIT => f.write_str("SIGQUIT"),
            Signal::TERM => f.write_str("SIGTERM"),
            Signal(other) => write!(f, "signal {other}"),
        }
    }
}
