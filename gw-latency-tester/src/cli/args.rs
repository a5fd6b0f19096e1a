//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::gpio::DEFAULT_SYSFS_ROOT;

#[derive(Parser, Debug)]
#[command(
    name = "gw-latency-tester",
    version,
    about = "Measure emitter-to-receiver latency through a GPIO loopback fixture",
    after_help = "\
LINES:
   DIO:  0  1  2  3
         ----------
GW54xx:  9 19 41 42
GW53xx: 16 19 17 20
GW52xx: 16 19 17 20
GW51xx: 16 19 17 18
GW552x: 16 19 17 20
GW551x (with GW16111 on J12): 224 225 226 227

EXAMPLES:
    gw-latency-tester 9 19 41 42                 Single cycle on a GW54xx
    gw-latency-tester 16 19 17 20 100 10000 0.2  100 cycles, 10ms apart"
)]
pub struct Args {
    /// GPIO powering the receiver (DIO 0)
    #[arg(value_name = "PWR_DIO")]
    pub power: u32,

    /// GPIO driving the emitter (DIO 1)
    #[arg(value_name = "EMIT_DIO")]
    pub emitter: u32,

    /// GPIO of the status LED (DIO 2)
    #[arg(value_name = "LED_DIO")]
    pub status: u32,

    /// GPIO reading the receiver (DIO 3)
    #[arg(value_name = "RECV_DIO")]
    pub receiver: u32,

    /// Number of probe cycles
    #[arg(value_name = "COUNT", default_value = "1")]
    pub count: u32,

    /// Delay after each cycle, in microseconds
    #[arg(value_name = "UDELAY", default_value = "500000")]
    pub delay_us: u64,

    /// EWMA smoothing factor, 0 < alpha <= 1
    #[arg(value_name = "ALPHA", default_value = "0.1", allow_negative_numbers = true)]
    pub alpha: f64,

    /// Time for the receiver to settle after power-up, in milliseconds
    #[arg(long, value_name = "MS", default_value = "1000")]
    pub settle_ms: u64,

    /// Location of the sysfs GPIO class
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SYSFS_ROOT)]
    pub sysfs_root: PathBuf,

    /// Emit one JSON object per line instead of text
    #[arg(long)]
    pub json: bool,

    /// Suppress per-cycle output
    #[arg(short, long)]
    pub quiet: bool,
}
