//! Core domain types

use std::fmt;
use std::path::PathBuf;

/// Process ID on the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A profiler trace pulled from the device.
///
/// Invariant: `len > 0`. A zero-byte pull is rejected before this type is
/// ever constructed; an empty trace is equivalent to no trace at all.
#[derive(Debug, Clone)]
pub struct CapturedTrace {
    /// Local path of the pulled trace file.
    pub path: PathBuf,
    /// Size in bytes, always non-zero.
    pub len: u64,
}

impl CapturedTrace {
    /// Base name of the trace file, used to name the converted artifact.
    pub fn basename(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("perf_output")
    }
}
