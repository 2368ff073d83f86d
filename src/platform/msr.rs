//! Model specific register access through the msr driver's device nodes.
//!
//! Needs the `msr` kernel module loaded and, usually, root.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Result, TscError};

/// Intel MSR_PLATFORM_INFO
pub const MSR_PLATFORM_INFO: u32 = 0xce;

pub const DEFAULT_MSR_ROOT: &str = "/dev/cpu";

/// Reads `<root>/<cpu>/msr`. The file offset is the register index.
#[derive(Clone, Debug)]
pub struct MsrDevice {
    root: Cow<'static, Path>,
}

impl MsrDevice {
    /// Points at `/dev/cpu`. Does not allocate.
    pub fn new() -> Self {
        Self {
            root: Cow::Borrowed(Path::new(DEFAULT_MSR_ROOT)),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Cow::Owned(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, cpu: u32) -> PathBuf {
        self.root.join(cpu.to_string()).join("msr")
    }

    /// Read one 64 bit register. The device is opened and closed per call.
    pub fn read(&self, cpu: u32, register: u32) -> Result<u64> {
        let path = self.path(cpu);
        log::trace!("reading msr {:#x} from {}", register, path.display());

        let unavailable = |source| TscError::CalibrationUnavailable {
            cpu,
            register,
            source,
        };

        let mut file = File::open(&path).map_err(unavailable)?;
        file.seek(SeekFrom::Start(u64::from(register)))
            .map_err(unavailable)?;

        let mut buf = [0u8; 8];
        file.read_exact(&mut buf).map_err(unavailable)?;

        Ok(u64::from_le_bytes(buf))
    }
}

impl Default for MsrDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Read `register` on `cpu` from the default `/dev/cpu` tree.
pub fn read_calibration_register(cpu: u32, register: u32) -> Result<u64> {
    MsrDevice::new().read(cpu, register)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::ErrorKind;

    /// `<tmp>/<name>/<cpu>/msr` with `value` at `register`, removed on drop.
    struct FakeMsrTree {
        root: PathBuf,
    }

    impl FakeMsrTree {
        fn new(name: &str, cpu: u32, register: u32, value: u64) -> Self {
            let root =
                std::env::temp_dir().join(format!("tscclock-{}-{}", name, std::process::id()));
            let dir = root.join(cpu.to_string());
            fs::create_dir_all(&dir).unwrap();

            let mut contents = vec![0u8; register as usize];
            contents.extend_from_slice(&value.to_le_bytes());
            fs::write(dir.join("msr"), contents).unwrap();
            Self { root }
        }

        fn device(&self) -> MsrDevice {
            MsrDevice::with_root(&self.root)
        }
    }

    impl Drop for FakeMsrTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn test_reads_register_at_offset() {
        let tree = FakeMsrTree::new("offset", 3, MSR_PLATFORM_INFO, 0x0000_0800_7001_1a00);

        let value = tree.device().read(3, MSR_PLATFORM_INFO).unwrap();
        assert_eq!(value, 0x0000_0800_7001_1a00);
    }

    #[test]
    fn test_short_read_fails() {
        let tree = FakeMsrTree::new("short", 0, 0, 0xdead_beef);

        // file is only 8 bytes long, register 4 would read past the end
        let err = tree.device().read(0, 4).unwrap_err();
        match err {
            TscError::CalibrationUnavailable { cpu, register, source } => {
                assert_eq!(cpu, 0);
                assert_eq!(register, 4);
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_cpu_fails() {
        let tree = FakeMsrTree::new("missing", 0, 0, 0);

        assert!(matches!(
            tree.device().read(7, MSR_PLATFORM_INFO),
            Err(TscError::CalibrationUnavailable { cpu: 7, .. })
        ));
    }

    #[test]
    fn test_tree_is_removed_even_after_a_failed_assert() {
        let tree = FakeMsrTree::new("unwind", 1, 0, 7);
        let root = tree.root.clone();

        let outcome = std::panic::catch_unwind(move || {
            let _tree = tree;
            panic!("register value did not match");
        });

        assert!(outcome.is_err());
        assert!(!root.exists());
    }

    #[test]
    fn test_out_of_range_cpu_is_an_error_not_a_crash() {
        let result = read_calibration_register(u32::MAX, MSR_PLATFORM_INFO);
        assert!(matches!(
            result,
            Err(TscError::CalibrationUnavailable { .. })
        ));
    }

    #[test]
    fn test_device_path() {
        let device = MsrDevice::new();
        assert_eq!(device.root(), Path::new(DEFAULT_MSR_ROOT));
        assert_eq!(device.path(12), PathBuf::from("/dev/cpu/12/msr"));
    }
}
