use std::fmt;

use serde::Serialize;

/// Family and model packed as `(family << 16) | model`.
/// Family 06 = the ones we're interested in. Family 15 = netburst xeons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FamilyModel(u32);

impl FamilyModel {
    pub fn define(key: u32) -> Self {
        Self(key)
    }

    /// Decode the eax value returned by cpuid leaf 1.
    ///
    /// Extended model (bits 16..20) lands above the base model (bits 4..8),
    /// extended family (bits 20..28) above the base family (bits 8..12).
    pub fn from_signature(eax: u32) -> Self {
        let model = ((eax & 0xff) >> 4) | ((eax & 0xf0000) >> 12);
        let family = ((eax & 0xf00) >> 8) | ((eax & 0xff00000) >> 16);
        Self((family << 16) | model)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn family(&self) -> u32 {
        self.0 >> 16
    }

    pub fn model(&self) -> u32 {
        self.0 & 0xffff
    }
}

impl fmt::Display for FamilyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}", self.family(), self.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_skylake_client() {
        // i7-6700K: stepping 3, model e, family 6, extended model 5
        let key = FamilyModel::from_signature(0x0005_06e3);
        assert_eq!(key.value(), 0x6005e);
        assert_eq!(key.family(), 6);
        assert_eq!(key.model(), 0x5e);
    }

    #[test]
    fn test_decode_nehalem() {
        // Xeon 5500: 0x106a5 -> family 6, model 0x1a
        let key = FamilyModel::from_signature(0x0001_06a5);
        assert_eq!(key.value(), 0x6001a);
    }

    #[test]
    fn test_stepping_is_ignored() {
        let a = FamilyModel::from_signature(0x0003_06c0);
        let b = FamilyModel::from_signature(0x0003_06cf);
        assert_eq!(a, b);
        assert_eq!(a.value(), 0x6003c);
    }

    #[test]
    fn test_extended_family_is_merged() {
        // extended family field 0x0f, base family 0x0f -> family 0x0f | 0x0f0
        let key = FamilyModel::from_signature(0x00f0_0f00);
        assert_eq!(key.family(), 0xff);
        assert_eq!(key.model(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(FamilyModel::define(0x6003f).to_string(), "06:3f");
    }
}
