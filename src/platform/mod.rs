//! The three hardware primitives the calibration logic needs.
//!
//! Everything above this module works on raw values handed back by a
//! [`Platform`], so it can be driven by a fake in tests.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod cpuid;
pub mod msr;

use std::path::PathBuf;

use crate::error::Result;

pub use msr::{read_calibration_register, MsrDevice, MSR_PLATFORM_INFO};

pub trait Platform {
    /// eax of cpuid leaf 1
    fn cpuid_signature(&self) -> u32;

    /// Read a model specific register on `cpu`
    fn read_msr(&self, cpu: u32, register: u32) -> Result<u64>;

    /// Cycle count and the IA32_TSC_AUX value rdtscp loaded into ecx
    fn rdtscp(&self) -> (u64, u32);
}

/// The cpu this code is running on.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Clone, Debug, Default)]
pub struct Hardware {
    msr: MsrDevice,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Hardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for msr device nodes under `root` instead of `/dev/cpu`.
    pub fn with_msr_root(root: impl Into<PathBuf>) -> Self {
        Self {
            msr: MsrDevice::with_root(root),
        }
    }

    pub fn msr_device(&self) -> &MsrDevice {
        &self.msr
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Platform for Hardware {
    #[inline]
    fn cpuid_signature(&self) -> u32 {
        cpuid::cpuid_signature()
    }

    fn read_msr(&self, cpu: u32, register: u32) -> Result<u64> {
        self.msr.read(cpu, register)
    }

    #[inline(always)]
    fn rdtscp(&self) -> (u64, u32) {
        crate::perf::rdtsc::rdtscp()
    }
}
