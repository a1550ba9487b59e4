//! Profiling helper toolchain and prebuilt-binary lookup.
//!
//! Symbol extraction knows about ELF images, build-id matching and kernel
//! symbol tables; none of that lives in this crate. The controller only
//! needs the operations below, and judges capability by whether a helper is
//! present at all.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::device::Device;

/// Host-side helper toolchain for on-device perf profiling.
pub trait ProfilingHelper {
    /// Whether the helper toolchain is present in this environment.
    /// Pure capability check, never fails.
    fn is_available(&self) -> bool;

    /// Push and configure the profiler binary on the device; returns its
    /// on-device path. `build_type` selects which helper build artifacts
    /// are used. Idempotent.
    fn prepare_device_for_perf(&self, device: &dyn Device, build_type: &str) -> Result<String>;

    /// Library paths referenced by the samples in `trace`. An empty set is
    /// legitimate (a trace with no qualifying samples).
    fn required_libraries(&self, trace: &Path) -> Result<BTreeSet<String>>;

    /// Mirror `libs` (and a kernel symbol table snapshot) under `symfs_dir`
    /// so addresses recorded on the device resolve on this host; returns
    /// the kernel symbol table path. `use_symlinks = false` copies files.
    fn create_symfs(
        &self,
        device: &dyn Device,
        symfs_dir: &Path,
        libs: &BTreeSet<String>,
        use_symlinks: bool,
    ) -> Result<PathBuf>;
}

/// Lookup of prebuilt platform-specific support binaries.
pub trait BinaryResolver {
    /// Local path of the prebuilt artifact `name` for `platform`.
    fn find_platform_binary(&self, name: &str, platform: &str) -> Result<PathBuf>;
}
