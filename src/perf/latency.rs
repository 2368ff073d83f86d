use std::io;

use serde::Serialize;

use super::rdtsc::{read_timestamp_with, STALE_AFFINITY};
use crate::calibration::TscCalibration;
use crate::platform::Platform;

/// Records the cycle cost of closures run on one pinned cpu.
pub struct LatencyTracker<P: Platform> {
    platform: P,
    cpu: u32,
    samples: Vec<u64>,
    /// reads that migrated off `cpu` or went backwards
    discarded: usize,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl LatencyTracker<crate::platform::Hardware> {
    /// Tracker for the real TSC. The calling thread must be pinned to `cpu`.
    pub fn pinned(cpu: u32, capacity: usize) -> Self {
        Self::with_platform(crate::platform::Hardware::new(), cpu, capacity)
    }
}

impl<P: Platform> LatencyTracker<P> {
    pub fn with_platform(platform: P, cpu: u32, capacity: usize) -> Self {
        Self {
            platform,
            cpu,
            samples: Vec::with_capacity(capacity),
            discarded: 0,
        }
    }

    #[inline(always)]
    pub fn record<F, R>(&mut self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = read_timestamp_with(&self.platform, self.cpu);
        let result = op();
        let end = read_timestamp_with(&self.platform, self.cpu);

        if start == STALE_AFFINITY || end == STALE_AFFINITY || end < start {
            self.discarded += 1;
        } else {
            self.samples.push(end - start);
        }

        result
    }

    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.discarded = 0;
    }
}

/// Distribution of recorded deltas, in cycles unless converted with `to_nanos`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    /// 99.9th
    pub p999: u64,
    /// 99.99th, only meaningful past ten thousand samples
    pub p9999: u64,
}

impl Percentiles {
    /// Same statistics with every value converted from cycles to nanoseconds.
    pub fn to_nanos(&self, calibration: &TscCalibration) -> Percentiles {
        let ns = |cycles| calibration.cycles_to_nanos(cycles);
        Percentiles {
            min: ns(self.min),
            max: ns(self.max),
            mean: self.mean * calibration.scale_factor as f64 / 1024.0,
            p50: ns(self.p50),
            p95: ns(self.p95),
            p99: ns(self.p99),
            p999: ns(self.p999),
            p9999: ns(self.p9999),
        }
    }
}

#[derive(Serialize)]
struct SampleRecord {
    cycles: u64,
    nanos: Option<u64>,
}

impl<P: Platform> LatencyTracker<P> {
    /// Cycle percentiles. Sorts the recorded samples in place.
    pub fn percentiles(&mut self) -> Option<Percentiles> {
        if self.samples.is_empty() {
            return None;
        }

        self.samples.sort_unstable();

        let len = self.samples.len();
        let min = self.samples[0];
        let max = self.samples[len - 1];
        let sum: u128 = self.samples.iter().map(|&s| s as u128).sum();
        let mean = sum as f64 / len as f64;

        Some(Percentiles {
            min,
            max,
            mean,
            p50: self.percentile_at(0.50),
            p95: self.percentile_at(0.95),
            p99: self.percentile_at(0.99),
            p999: self.percentile_at(0.999),
            p9999: self.percentile_at(0.9999),
        })
    }

    fn percentile_at(&self, p: f64) -> u64 {
        debug_assert!(!self.samples.is_empty());
        debug_assert!((0.0..=1.0).contains(&p));

        let index = (p * (self.samples.len() - 1) as f64) as usize;
        self.samples[index]
    }

    /// Dump raw samples as `cycles,nanos` rows. `nanos` is empty without a calibration.
    pub fn write_csv<W: io::Write>(
        &self,
        writer: W,
        calibration: Option<&TscCalibration>,
    ) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for &cycles in &self.samples {
            csv.serialize(SampleRecord {
                cycles,
                nanos: calibration.map(|c| c.cycles_to_nanos(cycles)),
            })?;
        }
        csv.flush()?;
        Ok(())
    }
}
