//! Pre-flight checks for gw-latency-tester
//!
//! Validates system requirements before any line is exported.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Result};
use std::path::Path;

/// Run all pre-flight checks before touching GPIO
pub fn run_preflight_checks(sysfs_root: &Path, quiet: bool) -> Result<()> {
    check_sysfs_interface(sysfs_root)?;
    if !quiet {
        check_privileges();
    }
    Ok(())
}

/// Check that the sysfs GPIO class is present
fn check_sysfs_interface(sysfs_root: &Path) -> Result<()> {
    if !sysfs_root.is_dir() {
        bail!(
            "GPIO sysfs interface not found at {}\n\n\
             The kernel must be built with CONFIG_GPIO_SYSFS, or pass --sysfs-root.",
            sysfs_root.display()
        );
    }
    if !sysfs_root.join("export").exists() {
        bail!(
            "{} has no export entry\n\n\
             --sysfs-root must point at the GPIO class directory (e.g. /sys/class/gpio).",
            sysfs_root.display()
        );
    }
    Ok(())
}

/// Warn when not running as root
///
/// Membership in a gpio group can be enough, so this never fails.
fn check_privileges() {
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("warning: not running as root, exporting lines may be denied");
    }
}
