//! Structured error types for perfdrive
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Transport and helper failures stay as plain `anyhow` chains; these
//! variants cover the decisions this crate makes itself.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("Profiling helper toolchain is not available on this host")]
    Unsupported,

    #[error("A profiling session is already active")]
    SessionActive,

    #[error("Session is still running; call stop_tracing before pulling")]
    SessionNotStopped,

    #[error("No stopped session to pull a trace from")]
    NoStoppedSession,

    #[error("Perf recorded no data. Log output:\n{log}")]
    TraceMissing { log: String },

    #[error("Perf recorded a zero-sized file. Log output:\n{log}")]
    TraceEmpty { log: String },

    #[error("Profiler did not stop within {timeout:?}; driving process killed")]
    StopTimeout { timeout: Duration },

    #[error("Trace converter exited with status {status}")]
    ConverterFailed { status: i32 },

    #[error("Trace converter produced no usable output at {path}")]
    ConverterEmptyOutput { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
