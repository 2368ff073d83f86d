//! Nanosecond timestamps from the invariant TSC on Intel x86 parts.
//!
//! Calibrate once per pinned cpu, then convert cycle deltas on the hot path:
//!
//! ```no_run
//! use tscclock::{read_timestamp, TscCalibration};
//!
//! // the calling thread is pinned to cpu 3, and /dev/cpu/3/msr is readable
//! let calibration = TscCalibration::calibrate(3)?;
//!
//! let start = read_timestamp(3);
//! // ... work ...
//! let end = read_timestamp(3);
//! println!("{:?} ns", calibration.elapsed_nanos(start, end));
//! # Ok::<(), tscclock::TscError>(())
//! ```

pub mod calibration;
pub mod error;
pub mod perf;
pub mod platform;
pub mod types;

pub use calibration::{
    compute_scale_factor, convert_cycles_to_nanos, resolve_tsc_frequency_khz_with, TscCalibration,
    SCALE_SHIFT,
};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use calibration::resolve_tsc_frequency_khz;
pub use error::{Result, TscError};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use perf::{read_timestamp, try_read_timestamp};
pub use perf::{STALE_AFFINITY, TscAux};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use platform::Hardware;
pub use platform::{read_calibration_register, Platform, MSR_PLATFORM_INFO};
pub use types::{classify_processor, FamilyModel, Microarchitecture};
