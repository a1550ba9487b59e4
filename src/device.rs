//! Remote-device transport interface.
//!
//! The controller drives the on-device profiler entirely through these
//! traits; process spawning, file transfer and shell execution live behind
//! them. Implementations (adb, ssh, emulator pipes) are supplied by the
//! caller and their failures propagate unmodified as `anyhow` chains.

use anyhow::Result;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::domain::Pid;

/// Handle to a temporary file on the device.
///
/// The implementation owns deletion of the remote side: `close` removes it
/// eagerly, and dropping the handle without closing must clean up best
/// effort.
pub trait RemoteTempFile {
    /// Absolute path of the file on the device.
    fn name(&self) -> &str;

    /// Delete the remote file. Called at most once.
    fn close(&mut self) -> Result<()>;
}

/// A running local process that tunnels the remote profiler.
pub trait RemoteProcess {
    /// Block until the process exits; returns its exit code.
    fn wait(&mut self) -> Result<i32>;

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    /// `Ok(None)` means the process is still running.
    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<i32>>;

    /// Forcibly terminate the process.
    fn kill(&mut self) -> Result<()>;
}

/// Command execution and file transfer on the target device.
pub trait Device {
    /// Identity used in log messages (serial number or address).
    fn id(&self) -> &str;

    /// Run a shell command on the device and return its output lines.
    fn run_shell_command(&self, cmd: &str) -> Result<Vec<String>>;

    /// Pids of all device processes whose name matches `process_name`.
    fn extract_pids(&self, process_name: &str) -> Result<Vec<Pid>>;

    /// Whether `remote_path` exists on the device.
    fn file_exists(&self, remote_path: &str) -> Result<bool>;

    /// Copy a device file to `local_path`.
    fn pull_file(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Create a temporary file on the device. Closing (or dropping) the
    /// handle deletes the remote side.
    fn create_remote_temp_file(&self, prefix: &str) -> Result<Box<dyn RemoteTempFile>>;

    /// Spawn `cmd` through the device transport as a background process,
    /// with its combined stdout/stderr redirected into `log`. Returns
    /// without waiting for the command to finish.
    fn spawn_shell(&self, cmd: &[String], log: File) -> Result<Box<dyn RemoteProcess>>;
}
