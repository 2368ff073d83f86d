//! Invariant TSC frequency from MSR_PLATFORM_INFO, and the fixed point
//! math to turn cycle counts into nanoseconds.
//!
//! The frequency is `non_turbo_ratio * bclk`. If the board vendor messes about
//! with the bclk then the base clock we assume will be wrong; nothing here
//! tries to detect that.

use std::io;

use serde::Serialize;

use crate::error::{Result, TscError};
use crate::platform::{Platform, MSR_PLATFORM_INFO};
use crate::types::family_model::FamilyModel;
use crate::types::microarch::{classify_processor, Microarchitecture};

/// Fractional bits of the cycles to nanoseconds scale factor.
pub const SCALE_SHIFT: u32 = 10;

const NSEC_PER_MSEC: u32 = 1_000_000;

/// Bits 15:8 of MSR_PLATFORM_INFO
#[inline]
pub fn non_turbo_ratio(platform_info: u64) -> u32 {
    ((platform_info & 0xff00) >> 8) as u32
}

/// Invariant TSC frequency in kHz of the cpu we are running on, reading the
/// platform info register of `cpu`.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn resolve_tsc_frequency_khz(cpu: u32) -> Result<u32> {
    resolve_tsc_frequency_khz_with(&crate::platform::Hardware::new(), cpu)
}

pub fn resolve_tsc_frequency_khz_with<P: Platform>(platform: &P, cpu: u32) -> Result<u32> {
    resolve(platform, cpu).map(|(_, _, khz)| khz)
}

fn resolve<P: Platform>(platform: &P, cpu: u32) -> Result<(FamilyModel, Microarchitecture, u32)> {
    let family_model = FamilyModel::from_signature(platform.cpuid_signature());
    let arch = classify_processor(family_model.value());

    log::debug!("detected processor with family/model of {}", family_model);
    log::debug!(
        "this is a {} processor with a base clock of {}khz",
        arch.name(),
        arch.base_clock_khz()
    );

    if !arch.is_supported() {
        log::warn!(
            "processor too new, too old, or not detected (family/model {})",
            family_model
        );
        return Err(TscError::UnsupportedProcessor { family_model });
    }

    let platform_info = platform
        .read_msr(cpu, MSR_PLATFORM_INFO)
        .inspect_err(|e| log::warn!("error reading MSR_PLATFORM_INFO: {}", e))?;

    let ratio = non_turbo_ratio(platform_info);
    if ratio == 0 {
        log::warn!("MSR_PLATFORM_INFO on cpu {} reports a zero non-turbo ratio", cpu);
        return Err(TscError::CalibrationUnavailable {
            cpu,
            register: MSR_PLATFORM_INFO,
            source: io::Error::new(io::ErrorKind::InvalidData, "non-turbo ratio is zero"),
        });
    }

    Ok((family_model, arch, ratio * arch.base_clock_khz()))
}

/// Fixed point (Q10) multiplier turning cycles into nanoseconds.
///
/// Same math as the cyc2ns scale in arch/x86/kernel/tsc.c.
///
/// # Panics
///
/// If `frequency_khz` is zero. A zero frequency means a failed calibration
/// went unchecked.
#[inline]
pub fn compute_scale_factor(frequency_khz: u32) -> u32 {
    assert_ne!(frequency_khz, 0, "tsc frequency must be calibrated before use");
    (NSEC_PER_MSEC << SCALE_SHIFT) / frequency_khz
}

/// `(cycles * scale_factor) >> 10`.
///
/// The product is taken at 128 bits so large deltas don't wrap.
/// Callers must make sure `cycles` is a forward delta.
#[inline(always)]
pub fn convert_cycles_to_nanos(cycles: u64, scale_factor: u32) -> u64 {
    ((cycles as u128 * scale_factor as u128) >> SCALE_SHIFT) as u64
}

/// Everything learned from calibrating one cpu.
///
/// Stays valid for as long as the bclk and the caller's cpu pinning don't change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TscCalibration {
    pub cpu: u32,
    pub family_model: FamilyModel,
    pub microarchitecture: Microarchitecture,
    pub frequency_khz: u32,
    pub scale_factor: u32,
}

impl TscCalibration {
    /// Calibrate against the hardware. Call from a thread pinned to `cpu`.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn calibrate(cpu: u32) -> Result<Self> {
        Self::calibrate_with(&crate::platform::Hardware::new(), cpu)
    }

    pub fn calibrate_with<P: Platform>(platform: &P, cpu: u32) -> Result<Self> {
        let (family_model, microarchitecture, frequency_khz) = resolve(platform, cpu)?;
        let scale_factor = compute_scale_factor(frequency_khz);

        log::info!(
            "invariant TSC on cpu {} runs at {} kHz, scale factor {}",
            cpu,
            frequency_khz,
            scale_factor
        );

        Ok(Self {
            cpu,
            family_model,
            microarchitecture,
            frequency_khz,
            scale_factor,
        })
    }

    /// Build from a frequency found some other way.
    pub fn from_frequency_khz(cpu: u32, frequency_khz: u32) -> Self {
        Self {
            cpu,
            family_model: FamilyModel::define(0),
            microarchitecture: Microarchitecture::Unsupported,
            frequency_khz,
            scale_factor: compute_scale_factor(frequency_khz),
        }
    }

    #[inline(always)]
    pub fn cycles_to_nanos(&self, cycles: u64) -> u64 {
        convert_cycles_to_nanos(cycles, self.scale_factor)
    }

    /// Nanoseconds between two timestamps, `None` if `end` is before `start`.
    #[inline]
    pub fn elapsed_nanos(&self, start: u64, end: u64) -> Option<u64> {
        end.checked_sub(start).map(|cycles| self.cycles_to_nanos(cycles))
    }
}
