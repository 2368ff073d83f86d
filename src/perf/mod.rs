pub mod latency;
pub mod rdtsc;

pub use latency::{LatencyTracker, Percentiles};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use rdtsc::{rdtscp, read_timestamp, try_read_timestamp};
pub use rdtsc::{decode_tsc_aux, read_timestamp_with, try_read_timestamp_with, TscAux, STALE_AFFINITY};
