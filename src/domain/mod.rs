//! Domain model for perfdrive
//!
//! Core types and errors shared across the lifecycle:
//! - Compile-time safety via newtype pattern
//! - Structured error handling

pub mod errors;
pub mod types;

pub use errors::ProfilerError;
pub use types::{CapturedTrace, Pid};
