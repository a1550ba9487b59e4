//! Pre-flight capability checks and device preparation.
//!
//! Gate-keeps profiling: verifies the helper toolchain exists before any
//! session is constructed, and pushes the profiler binary to the device.

use anyhow::Result;

use crate::device::Device;
use crate::toolchain::ProfilingHelper;

/// Helper build artifacts used when no build type is configured.
pub const DEFAULT_BUILD_TYPE: &str = "Release";

/// Determines whether profiling is usable on this host/device pair and
/// prepares the device into a profiling-capable state.
pub struct CapabilityProbe<'a> {
    helper: &'a dyn ProfilingHelper,
    build_type: String,
}

impl<'a> CapabilityProbe<'a> {
    /// `build_type` selects which helper build artifacts are pushed;
    /// defaults to `"Release"`. The value is threaded explicitly instead of
    /// mutating process-wide environment state.
    pub fn new(helper: &'a dyn ProfilingHelper, build_type: Option<String>) -> Self {
        Self {
            helper,
            build_type: build_type.unwrap_or_else(|| DEFAULT_BUILD_TYPE.to_string()),
        }
    }

    /// Whether the profiling helper toolchain is present at all.
    /// Pure check, no side effects.
    pub fn is_supported(&self) -> bool {
        self.helper.is_available()
    }

    /// Push and configure the profiler binary on the device; returns its
    /// on-device path. Safe to call repeatedly with the same result.
    pub fn prepare_device(&self, device: &dyn Device) -> Result<String> {
        let binary = self.helper.prepare_device_for_perf(device, &self.build_type)?;
        log::debug!("profiler binary ready on {}: {binary}", device.id());
        Ok(binary)
    }

    /// Ask the on-device profiler for its supported sampling categories.
    /// Output lines are returned verbatim; no validation happens here.
    pub fn categories(&self, device: &dyn Device) -> Result<Vec<String>> {
        let binary = self.prepare_device(device)?;
        device.run_shell_command(&format!("{binary} list"))
    }
}
