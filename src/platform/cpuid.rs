#[cfg(target_arch = "x86")]
use core::arch::x86::__cpuid;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::__cpuid;

use crate::types::family_model::FamilyModel;

/// Leaf 1 returns the processor signature in eax.
pub const CPUID_SIGNATURE_LEAF: u32 = 1;

/// Raw eax of cpuid leaf 1 on the cpu we are currently running on.
#[inline]
#[allow(unused_unsafe)]
pub fn cpuid_signature() -> u32 {
    // cpuid is available on every x86_64 part and anything i586 or newer
    unsafe { __cpuid(CPUID_SIGNATURE_LEAF).eax }
}

/// Family and model of the cpu we are currently running on.
/// Always returns a value, it may not be one we know about.
pub fn detect_family_model() -> FamilyModel {
    FamilyModel::from_signature(cpuid_signature())
}
