pub mod family_model;
pub mod microarch;

pub use family_model::FamilyModel;
pub use microarch::{classify_processor, Microarchitecture, MicroarchitectureEntry, PROCESSOR_TYPES};
