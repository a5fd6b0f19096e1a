//! Termination requests
//!
//! SIGINT, SIGQUIT and SIGTERM are turned into a [`TerminationToken`] the run
//! loop polls at its safe points. The first request only stores the signal
//! number; teardown happens on the main path once the request is observed.
//!
//! A repeated request means the main path is stuck somewhere it does not poll
//! (a blocked write, for instance). The handler then forces every line armed
//! with [`ForcedRelease`] to output low over its raw descriptors and exits
//! with `128 + signal` without returning.

#![allow(unsafe_code)] // sigaction() requires unsafe

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::Signal;

/// Longest uninterrupted sleep while waiting between cycles
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Cell the installed handler writes into
static HANDLER_TARGET: OnceLock<Arc<AtomicI32>> = OnceLock::new();

/// Lines the handler may force low, as (direction, value) descriptor pairs
const FORCED_SLOTS: usize = 4;

#[allow(clippy::declare_interior_mutable_const)]
const NO_FD: AtomicI32 = AtomicI32::new(-1);
static FORCED_FDS: [AtomicI32; FORCED_SLOTS * 2] = [NO_FD; FORCED_SLOTS * 2];

/// Shared flag recording the first termination request
///
/// Clones observe the same request.
#[derive(Debug, Clone, Default)]
pub struct TerminationToken {
    pending: Arc<AtomicI32>,
}

impl TerminationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a termination request. Only the first request is kept.
    pub fn request(&self, signal: Signal) {
        let _ = self.pending.compare_exchange(0, signal.0, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Pending request, if any
    pub fn requested(&self) -> Option<Signal> {
        match self.pending.load(Ordering::SeqCst) {
            0 => None,
            signo => Some(Signal(signo)),
        }
    }

    /// Sleep for `duration`, waking early if termination is requested
    ///
    /// Returns the pending signal if the wait was cut short.
    pub fn sleep(&self, duration: Duration) -> Option<Signal> {
        let deadline = Instant::now() + duration;
        loop {
            if let Some(signal) = self.requested() {
                return Some(signal);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Record `signo` in `pending`. Returns `true` if a request was already
/// pending, which keeps the first one.
fn is_repeat_request(pending: &AtomicI32, signo: i32) -> bool {
    pending.compare_exchange(0, signo, Ordering::SeqCst, Ordering::SeqCst).is_err()
}

extern "C" fn on_termination(signo: libc::c_int) {
    // Atomics and raw syscalls only: this runs in signal context
    let Some(pending) = HANDLER_TARGET.get() else {
        return;
    };
    if is_repeat_request(pending, signo) {
        force_release_armed();
        // SAFETY: _exit is async-signal-safe and skips all user-space cleanup
        unsafe { libc::_exit(Signal(signo).exit_code()) };
    }
}

/// Write `text` at offset 0 of `fd`, ignoring failures
fn rewrite_raw(fd: RawFd, text: &[u8]) {
    // SAFETY: plain syscalls on a descriptor we were handed while it was open;
    // text outlives the call
    unsafe {
        libc::lseek(fd, 0, libc::SEEK_SET);
        libc::write(fd, text.as_ptr().cast(), text.len());
    }
}

/// Drive every armed line to output low. Async-signal-safe.
fn force_release_armed() {
    for slot in 0..FORCED_SLOTS {
        let direction = FORCED_FDS[slot * 2].load(Ordering::SeqCst);
        let value = FORCED_FDS[slot * 2 + 1].load(Ordering::SeqCst);
        if direction >= 0 {
            rewrite_raw(direction, b"out");
        }
        if value >= 0 {
            rewrite_raw(value, b"0");
        }
    }
}

/// Lines the signal handler may force low if the main path stops responding
///
/// The descriptors must stay open while armed: drop this guard before the
/// lines are closed. Only one guard should be live at a time.
#[derive(Debug)]
pub struct ForcedRelease {
    armed: usize,
}

impl ForcedRelease {
    /// Arm up to four (direction, value) descriptor pairs
    pub fn arm(lines: impl IntoIterator<Item = (RawFd, RawFd)>) -> Self {
        let mut armed = 0;
        for (direction, value) in lines.into_iter().take(FORCED_SLOTS) {
            FORCED_FDS[armed * 2 + 1].store(value, Ordering::SeqCst);
            FORCED_FDS[armed * 2].store(direction, Ordering::SeqCst);
            armed += 1;
        }
        log::debug!("Forced release armed for {armed} lines");
        Self { armed }
    }

    /// Number of lines the handler would force low
    pub fn armed(&self) -> usize {
        self.armed
    }
}

impl Drop for ForcedRelease {
    fn drop(&mut self) {
        for fd in &FORCED_FDS {
            fd.store(-1, Ordering::SeqCst);
        }
    }
}

/// Re-deliver `signal` with its default action so the parent sees the
/// process as killed by it
///
/// Only returns if the signal does not terminate the process.
pub fn reraise(signal: Signal) {
    // SAFETY: restoring SIG_DFL and raising take no pointers
    unsafe {
        libc::signal(signal.0, libc::SIG_DFL);
        libc::raise(signal.0);
    }
}

/// Route SIGINT, SIGQUIT and SIGTERM to `token`
///
/// Can be called once per process.
///
/// # Errors
/// Returns an error if handlers were already installed for another token or
/// `sigaction` fails
pub fn install_signal_handlers(token: &TerminationToken) -> io::Result<()> {
    HANDLER_TARGET.set(Arc::clone(&token.pending)).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "termination handlers already installed")
    })?;

    for signal in [Signal::INT, Signal::QUIT, Signal::TERM] {
        // SAFETY: sigaction is a plain C struct; all-zero is a valid initial state
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = on_termination as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;

        // SAFETY: action.sa_mask is a valid sigset_t owned by this frame
        unsafe { libc::sigemptyset(&mut action.sa_mask) };

        // SAFETY: action is fully initialised and the handler is async-signal-safe
        if unsafe { libc::sigaction(signal.0, &action, std::ptr::null_mut()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        log::debug!("Installed handler for {signal}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// The armed descriptor table is process-global
    static FORCED_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_fresh_token_has_no_request() {
        assert_eq!(TerminationToken::new().requested(), None);
    }

    #[test]
    fn test_first_request_wins() {
        let token = TerminationToken::new();
        token.request(Signal::TERM);
        token.request(Signal::INT);
        assert_eq!(token.requested(), Some(Signal::TERM));
    }

    #[test]
    fn test_clones_share_request() {
        let token = TerminationToken::new();
        let handler_side = token.clone();
        handler_side.request(Signal::QUIT);
        assert_eq!(token.requested(), Some(Signal::QUIT));
    }

    #[test]
    fn test_sleep_completes_without_request() {
        let token = TerminationToken::new();
        let start = Instant::now();
        assert_eq!(token.sleep(Duration::from_millis(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_sleep_cut_short_by_request() {
        let token = TerminationToken::new();
        let remote = token.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.request(Signal::INT);
        });

        let start = Instant::now();
        assert_eq!(token.sleep(Duration::from_secs(30)), Some(Signal::INT));
        assert!(start.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }

    #[test]
    fn test_repeat_request_escalates() {
        let token = TerminationToken::new();
        token.request(Signal::INT);
        assert!(is_repeat_request(&token.pending, libc::SIGTERM));
        assert_eq!(token.requested(), Some(Signal::INT));
    }

    #[test]
    fn test_first_request_does_not_escalate() {
        let token = TerminationToken::new();
        assert!(!is_repeat_request(&token.pending, libc::SIGTERM));
        assert_eq!(token.requested(), Some(Signal::TERM));
    }

    #[test]
    fn test_forced_release_drives_armed_lines_low() {
        use std::fs::{self, OpenOptions};
        use std::os::unix::io::AsRawFd;

        let _serial = FORCED_LOCK.lock().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let open = |name: &str, text: &str| {
            let path = dir.path().join(name);
            fs::write(&path, text).unwrap();
            OpenOptions::new().read(true).write(true).open(path).unwrap()
        };
        let direction = open("direction", "in\n");
        let value = open("value", "1\n");

        let guard = ForcedRelease::arm([(direction.as_raw_fd(), value.as_raw_fd())]);
        assert_eq!(guard.armed(), 1);
        force_release_armed();

        assert!(fs::read_to_string(dir.path().join("direction")).unwrap().starts_with("out"));
        assert!(fs::read_to_string(dir.path().join("value")).unwrap().starts_with('0'));
    }

    #[test]
    fn test_disarmed_lines_are_left_alone() {
        use std::fs::{self, OpenOptions};
        use std::os::unix::io::AsRawFd;

        let _serial = FORCED_LOCK.lock().unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("value");
        fs::write(&path, "1\n").unwrap();
        let value = OpenOptions::new().read(true).write(true).open(&path).unwrap();

        drop(ForcedRelease::arm([(-1, value.as_raw_fd())]));
        force_release_armed();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n");
    }

    #[test]
    fn test_install_routes_raised_signal() {
        let token = TerminationToken::new();
        install_signal_handlers(&token).unwrap();

        // SAFETY: raise() delivers to this thread; our handler only stores an integer
        unsafe { libc::raise(libc::SIGQUIT) };
        assert_eq!(token.requested(), Some(Signal::QUIT));

        // A second token cannot steal the handlers
        assert!(install_signal_handlers(&TerminationToken::new()).is_err());
    }
}
