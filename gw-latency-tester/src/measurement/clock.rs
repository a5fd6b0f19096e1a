//! Monotonic clock used to timestamp probe cycles

#![allow(unsafe_code)] // clock_gettime() requires unsafe

use std::io;
use std::time::Duration;

use crate::domain::Timestamp;

/// Source of monotonic timestamps
pub trait MonotonicClock {
    /// Current reading; never goes backwards
    fn now(&self) -> Timestamp;

    /// Smallest step the clock can represent
    fn resolution(&self) -> Duration;
}

/// Kernel clock that is not slewed by NTP
#[cfg(target_os = "linux")]
const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
#[cfg(not(target_os = "linux"))]
const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

/// `CLOCK_MONOTONIC_RAW` via `clock_gettime`
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMonotonicClock;

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn timespec_parts(ts: &libc::timespec) -> (u64, u32) {
    // Monotonic clocks never report negative fields
    (ts.tv_sec.max(0) as u64, ts.tv_nsec.clamp(0, 999_999_999) as u32)
}

fn gettime(clock: libc::clockid_t) -> io::Result<Timestamp> {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: ts is a valid, writable timespec; an unknown clock fails with EINVAL
    if unsafe { libc::clock_gettime(clock, &mut ts) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let (secs, nanos) = timespec_parts(&ts);
    Ok(Timestamp::from_parts(secs, nanos))
}

fn getres(clock: libc::clockid_t) -> io::Result<Duration> {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    // SAFETY: ts is a valid, writable timespec; an unknown clock fails with EINVAL
    if unsafe { libc::clock_getres(clock, &mut ts) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let (secs, nanos) = timespec_parts(&ts);
    Ok(Duration::new(secs, nanos))
}

impl MonotonicClock for RawMonotonicClock {
    fn now(&self) -> Timestamp {
        gettime(CLOCK_ID).unwrap_or_else(|e| {
            log::warn!("clock_gettime failed: {e}");
            Timestamp(0)
        })
    }

    fn resolution(&self) -> Duration {
        getres(CLOCK_ID).unwrap_or_else(|e| {
            log::warn!("clock_getres failed: {e}");
            Duration::ZERO
        })
    }
}
