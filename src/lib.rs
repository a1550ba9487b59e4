//! # perfdrive - Remote perf profiling session controller
//!
//! Drives a sampling profiler (`perf`) running on a remote device through a
//! pluggable transport, coordinating the full lifecycle:
//!
//! ```text
//! prepare -> record -> stop (signal-and-wait) -> pull -> symbolize -> convert
//! ```
//!
//! The heavy machinery lives behind traits: the device transport
//! ([`device::Device`]), the profiling helper toolchain
//! ([`toolchain::ProfilingHelper`]) and the prebuilt-binary lookup
//! ([`toolchain::BinaryResolver`]). This crate owns the lifecycle state
//! machine and its invariants:
//!
//! - a session is pulled only after it has been stopped;
//! - a missing or zero-byte trace is a hard failure that carries the
//!   profiler's captured log output, never a silent success;
//! - remote temp files and local log buffers are released on every exit
//!   path, including mid-pipeline failures.
//!
//! ## Typical usage
//!
//! ```rust,ignore
//! let config = ControllerConfig::default();
//! let mut controller = SessionController::new(&device, &helper, &resolver, config)?;
//! controller.start_tracing(&["sched".into(), "cpu-cycles".into()])?;
//! // ... exercise the workload ...
//! controller.stop_tracing()?;
//! let artifact = controller.pull_trace()?;
//! ```
//!
//! ## Module structure
//!
//! - [`controller`]: the session lifecycle state machine exposed to callers
//! - [`session`]: a single remote profiling run (spawn, signal, pull)
//! - [`symbolization`]: symfs construction and converter invocation
//! - [`preflight`]: capability check and device preparation
//! - [`device`] / [`toolchain`]: collaborator trait seams
//! - [`domain`]: core types and structured errors

pub mod controller;
pub mod device;
pub mod domain;
pub mod preflight;
pub mod session;
pub mod symbolization;
pub mod toolchain;

pub use controller::{ControllerConfig, SessionController, TraceController};
pub use domain::{CapturedTrace, Pid, ProfilerError};
