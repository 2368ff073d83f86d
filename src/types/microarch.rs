use serde::Serialize;

use crate::types::family_model::FamilyModel;

/// Identification for setting the bclk rate.
/// Discriminants index `PROCESSOR_TYPES`, keep the two in the same order.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Microarchitecture {
    Unsupported = 0,
    Nehalem,
    Westmere,
    SandyBridge,
    IvyBridge,
    Haswell,
    Broadwell,
    Skylake,
    XeonPhi,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MicroarchitectureEntry {
    pub name: &'static str,
    pub base_clock_khz: u32,
}

/// Nehalem and Westmere run a 133.33 MHz bclk, SandyBridge and later 100 MHz.
pub static PROCESSOR_TYPES: [MicroarchitectureEntry; 9] = [
    MicroarchitectureEntry { name: "Too Old/Unknown", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Nehalem", base_clock_khz: 133_330 },
    MicroarchitectureEntry { name: "Westmere", base_clock_khz: 133_330 },
    MicroarchitectureEntry { name: "Sandybridge", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Ivybridge", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Haswell", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Broadwell", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Skylake", base_clock_khz: 100_000 },
    MicroarchitectureEntry { name: "Xeon Phi", base_clock_khz: 100_000 },
];

impl Microarchitecture {
    pub const ALL: [Microarchitecture; 9] = [
        Microarchitecture::Unsupported,
        Microarchitecture::Nehalem,
        Microarchitecture::Westmere,
        Microarchitecture::SandyBridge,
        Microarchitecture::IvyBridge,
        Microarchitecture::Haswell,
        Microarchitecture::Broadwell,
        Microarchitecture::Skylake,
        Microarchitecture::XeonPhi,
    ];

    pub fn entry(self) -> &'static MicroarchitectureEntry {
        &PROCESSOR_TYPES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn base_clock_khz(self) -> u32 {
        self.entry().base_clock_khz
    }

    pub fn is_supported(self) -> bool {
        self != Microarchitecture::Unsupported
    }
}

/// Map a packed family/model key to its microarchitecture.
///
/// Section numbers refer to the MSR chapter of the Intel SDM Vol 3C.
/// Anything not listed is `Unsupported`.
pub fn classify_processor(family_model: u32) -> Microarchitecture {
    match family_model {
        // 35.5
        0x6001a | 0x6001e | 0x6001f | 0x6002e => Microarchitecture::Nehalem,
        // 35.6
        0x60025 | 0x6002c | 0x6002f => Microarchitecture::Westmere,
        // 35.8
        0x6002a | 0x6002d => Microarchitecture::SandyBridge,
        0x6003a | 0x6003e => Microarchitecture::IvyBridge,
        0x6003c | 0x6003f | 0x60045 | 0x60046 => Microarchitecture::Haswell,
        0x6003d | 0x60047 | 0x6004f | 0x60056 => Microarchitecture::Broadwell,
        0x6004e | 0x6005e => Microarchitecture::Skylake,
        0x60057 => Microarchitecture::XeonPhi,
        _ => Microarchitecture::Unsupported,
    }
}

impl From<FamilyModel> for Microarchitecture {
    fn from(key: FamilyModel) -> Self {
        classify_processor(key.value())
    }
}
