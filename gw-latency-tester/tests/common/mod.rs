//! In-memory GPIO bank and scripted clock shared by the integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use gw_latency_tester::domain::{Direction, Level, LineId, ResourceError, Signal, Timestamp};
use gw_latency_tester::gpio::{GpioChip, LineAssignment, LineHandle};
use gw_latency_tester::measurement::MonotonicClock;
use gw_latency_tester::termination::TerminationToken;

pub const POWER: LineId = LineId(16);
pub const EMITTER: LineId = LineId(19);
pub const STATUS: LineId = LineId(17);
pub const RECEIVER: LineId = LineId(20);

pub fn assignment() -> LineAssignment {
    LineAssignment::new(POWER, EMITTER, STATUS, RECEIVER)
}

/// Every call the bank saw, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Export(LineId),
    Unexport(LineId),
    Open(LineId),
    Close(LineId),
    Direction(LineId, Direction),
    Write(LineId, Level),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pin {
    pub exported: bool,
    pub open: bool,
    pub direction: Option<Direction>,
    pub level: Level,
}

/// Scripted receiver reading
#[derive(Debug, Clone, Copy)]
pub enum Read {
    Level(Level),
    Fail,
}

struct Hang {
    after_reads: u64,
    level: Level,
    token: TerminationToken,
    signal: Signal,
}

#[derive(Default)]
struct Bank {
    pins: HashMap<LineId, Pin>,
    ops: Vec<Op>,
    fail_export: bool,
    fail_open: HashSet<LineId>,
    fail_write: HashSet<LineId>,
    script: VecDeque<Read>,
    receiver_reads: u64,
    hang: Option<Hang>,
    frozen: Option<Level>,
}

impl Bank {
    fn pin(&mut self, line: LineId) -> &mut Pin {
        self.pins.entry(line).or_default()
    }

    /// Optical loopback: light on the sensor pulls the receiver low
    fn receiver_level(&mut self) -> Result<Level, ResourceError> {
        self.receiver_reads += 1;

        if let Some(level) = self.frozen {
            return Ok(level);
        }
        if let Some(hang) = &self.hang {
            if self.receiver_reads >= hang.after_reads {
                hang.token.request(hang.signal);
                self.frozen = Some(hang.level);
                return Ok(hang.level);
            }
        }

        match self.script.pop_front() {
            Some(Read::Level(level)) => Ok(level),
            Some(Read::Fail) => Err(ResourceError::Read {
                line: RECEIVER,
                source: io::Error::other("transient glitch"),
            }),
            None => {
                let emitter = self.pins.get(&EMITTER).map(|p| p.level).unwrap_or_default();
                Ok(if emitter == Level::High { Level::Low } else { Level::High })
            }
        }
    }
}

/// Shared-state fake GPIO bank; clones observe the same pins
#[derive(Clone, Default)]
pub struct FakeChip {
    bank: Rc<RefCell<Bank>>,
}

impl FakeChip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_export(&self) {
        self.bank.borrow_mut().fail_export = true;
    }

    pub fn fail_open(&self, line: LineId) {
        self.bank.borrow_mut().fail_open.insert(line);
    }

    pub fn fail_writes(&self, line: LineId) {
        self.bank.borrow_mut().fail_write.insert(line);
    }

    /// Receiver readings served before the loopback model takes over
    pub fn script(&self, reads: impl IntoIterator<Item = Read>) {
        self.bank.borrow_mut().script.extend(reads);
    }

    /// After `after_reads` receiver reads, request termination and freeze
    /// the receiver at `level`
    pub fn hang_after(&self, after_reads: u64, level: Level, token: &TerminationToken, signal: Signal) {
        self.bank.borrow_mut().hang =
            Some(Hang { after_reads, level, token: token.clone(), signal });
    }

    pub fn pin(&self, line: LineId) -> Pin {
        self.bank.borrow().pins.get(&line).copied().unwrap_or_default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.bank.borrow().ops.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.bank.borrow().ops.iter().filter(|o| **o == op).count()
    }

    pub fn receiver_reads(&self) -> u64 {
        self.bank.borrow().receiver_reads
    }

    /// All four lines released into their safe state
    pub fn assert_safe(&self) {
        for line in [POWER, EMITTER, STATUS, RECEIVER] {
            let pin = self.pin(line);
            assert!(!pin.open, "{line} still open");
            assert!(!pin.exported, "{line} still exported");
            assert_eq!(pin.direction, Some(Direction::Output), "{line} not an output");
            assert_eq!(pin.level, Level::Low, "{line} not driven low");
        }
    }
}

impl GpioChip for FakeChip {
    type Handle = FakeHandle;

    fn export(&self, line: LineId) -> Result<(), ResourceError> {
        let mut bank = self.bank.borrow_mut();
        bank.ops.push(Op::Export(line));
        if bank.fail_export {
            return Err(ResourceError::Export { line, source: io::Error::other("busy") });
        }
        bank.pin(line).exported = true;
        Ok(())
    }

    fn unexport(&self, line: LineId) -> Result<(), ResourceError> {
        let mut bank = self.bank.borrow_mut();
        bank.ops.push(Op::Unexport(line));
        bank.pin(line).exported = false;
        Ok(())
    }

    fn open(&self, line: LineId) -> Result<FakeHandle, ResourceError> {
        let mut bank = self.bank.borrow_mut();
        if bank.fail_open.contains(&line) {
            return Err(ResourceError::Open {
                line,
                attribute: "value",
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        bank.ops.push(Op::Open(line));
        bank.pin(line).open = true;
        Ok(FakeHandle { line, bank: Rc::clone(&self.bank) })
    }
}

pub struct FakeHandle {
    line: LineId,
    bank: Rc<RefCell<Bank>>,
}

impl LineHandle for FakeHandle {
    fn set_direction(&mut self, direction: Direction) -> Result<(), ResourceError> {
        let mut bank = self.bank.borrow_mut();
        if bank.fail_write.contains(&self.line) {
            return Err(ResourceError::WriteDirection {
                line: self.line,
                direction,
                source: io::Error::other("write failed"),
            });
        }
        bank.ops.push(Op::Direction(self.line, direction));
        bank.pin(self.line).direction = Some(direction);
        Ok(())
    }

    fn write_value(&mut self, level: Level) -> Result<(), ResourceError> {
        let mut bank = self.bank.borrow_mut();
        if bank.fail_write.contains(&self.line) {
            return Err(ResourceError::WriteValue {
                line: self.line,
                level,
                source: io::Error::other("write failed"),
            });
        }
        bank.ops.push(Op::Write(self.line, level));
        bank.pin(self.line).level = level;
        Ok(())
    }

    fn read_value(&mut self) -> Result<Level, ResourceError> {
        let mut bank = self.bank.borrow_mut();
        if self.line == RECEIVER {
            return bank.receiver_level();
        }
        Ok(bank.pin(self.line).level)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        let mut bank = self.bank.borrow_mut();
        bank.ops.push(Op::Close(self.line));
        bank.pin(self.line).open = false;
    }
}

/// Clock that replays fixed readings, then keeps ticking by 1ns
#[derive(Default)]
pub struct ScriptedClock {
    readings: RefCell<VecDeque<Timestamp>>,
    last: Cell<u64>,
}

impl ScriptedClock {
    pub fn new(readings: impl IntoIterator<Item = u64>) -> Self {
        Self {
            readings: RefCell::new(readings.into_iter().map(Timestamp).collect()),
            last: Cell::new(0),
        }
    }

    /// Readings that produce the given start/end intervals, in nanoseconds
    pub fn with_intervals(intervals_ns: &[u64]) -> Self {
        let mut readings = Vec::new();
        let mut t = 1_000_000_000;
        for interval in intervals_ns {
            readings.push(t);
            readings.push(t + interval);
            t += interval + 5_000_000;
        }
        Self::new(readings)
    }
}

impl MonotonicClock for ScriptedClock {
    fn now(&self) -> Timestamp {
        let next = self.readings.borrow_mut().pop_front().unwrap_or(Timestamp(self.last.get() + 1));
        self.last.set(next.0);
        next
    }

    fn resolution(&self) -> Duration {
        Duration::from_nanos(1)
    }
}
