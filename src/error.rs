use std::io;

use thiserror::Error;

use crate::perf::rdtsc::TscAux;
use crate::types::family_model::FamilyModel;

pub type Result<T> = std::result::Result<T, TscError>;

#[derive(Debug, Error)]
pub enum TscError {
    /// The family/model key did not match any known microarchitecture,
    /// so there is no base clock to multiply the ratio by.
    #[error("processor too new, too old, or not detected (family/model {family_model})")]
    UnsupportedProcessor { family_model: FamilyModel },

    /// Opening, seeking or reading the register device failed.
    /// Permission, offline cpu and unsupported register all land here.
    #[error("cannot read msr {register:#x} on cpu {cpu}: {source}")]
    CalibrationUnavailable {
        cpu: u32,
        register: u32,
        #[source]
        source: io::Error,
    },

    /// rdtscp ran on a different cpu than the caller pinned to
    #[error("timestamp read on cpu {} (node {}), expected cpu {expected}", .actual.cpu, .actual.node)]
    StaleAffinity { expected: u32, actual: TscAux },
}
