#[cfg(target_arch = "x86")]
use core::arch::x86::__rdtscp;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::__rdtscp;

use serde::Serialize;

use crate::error::{Result, TscError};
use crate::platform::Platform;

/// Returned by `read_timestamp` when the affinity check fails.
pub const STALE_AFFINITY: u64 = u64::MAX;

/// IA32_TSC_AUX as Linux programs it: `(node << 12) | cpu`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TscAux {
    pub cpu: u32,
    pub node: u32,
}

#[inline(always)]
pub fn decode_tsc_aux(aux: u32) -> TscAux {
    TscAux {
        cpu: aux & 0xfff,
        node: (aux & 0xfff000) >> 12,
    }
}

/// Read the Time-Stamp Counter with rdtscp.
///
/// rdtscp waits for all previous instructions to execute before reading the
/// counter, and also hands back IA32_TSC_AUX so we can tell which cpu we ran on.
/// See Intel Instruction Set reference Vol 2B.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline(always)]
pub fn rdtscp() -> (u64, u32) {
    let mut aux = 0u32;
    let cycles = unsafe { __rdtscp(&mut aux) };
    (cycles, aux)
}

/// `cycles`, or `STALE_AFFINITY` if the `affinity-check` feature is on
/// and `aux` names a cpu other than `expected_cpu`.
#[inline(always)]
fn checked_cycles(cycles: u64, aux: u32, expected_cpu: u32) -> u64 {
    if cfg!(feature = "affinity-check") && decode_tsc_aux(aux).cpu != expected_cpu {
        return STALE_AFFINITY;
    }
    cycles
}

#[inline(always)]
fn cycles_on(cycles: u64, aux: u32, expected_cpu: u32) -> Result<u64> {
    let actual = decode_tsc_aux(aux);
    if actual.cpu != expected_cpu {
        return Err(TscError::StaleAffinity {
            expected: expected_cpu,
            actual,
        });
    }
    Ok(cycles)
}

/// Cycles from the expected cpu, or `STALE_AFFINITY` if the
/// `affinity-check` feature is on and we ran somewhere else.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline(always)]
pub fn read_timestamp(expected_cpu: u32) -> u64 {
    let (cycles, aux) = rdtscp();
    checked_cycles(cycles, aux, expected_cpu)
}

#[inline(always)]
pub fn read_timestamp_with<P: Platform>(platform: &P, expected_cpu: u32) -> u64 {
    let (cycles, aux) = platform.rdtscp();
    checked_cycles(cycles, aux, expected_cpu)
}

/// Like `read_timestamp`, but always checks the cpu and says where we ended up.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub fn try_read_timestamp(expected_cpu: u32) -> Result<u64> {
    let (cycles, aux) = rdtscp();
    cycles_on(cycles, aux, expected_cpu)
}

#[inline]
pub fn try_read_timestamp_with<P: Platform>(platform: &P, expected_cpu: u32) -> Result<u64> {
    let (cycles, aux) = platform.rdtscp();
    cycles_on(cycles, aux, expected_cpu)
}
