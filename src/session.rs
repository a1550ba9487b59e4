//! A single remote profiling run.
//!
//! `RemoteSession` owns the remote temporary output file, the local log
//! buffer, and the local process driving the on-device profiler. The state
//! machine is `RUNNING -> STOPPED -> released`; `pull_result` consumes the
//! session so a second pull cannot compile.

use anyhow::{Context, Result};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::device::{Device, RemoteProcess, RemoteTempFile};
use crate::domain::{CapturedTrace, ProfilerError};

/// Fixed tuning flags for `perf record`:
/// - sample across all processes and CPUs so the current CPU gets recorded
///   into each sample
/// - `-g`: call-graph shorthand that needs no argument
/// - elevated real-time priority to avoid dropping samples (requires root)
/// - raw samples carry the CPU information
/// - 2000 Hz sampling frequency for usable coverage
const RECORD_OPTIONS: &[&str] =
    &["--all-cpus", "-g", "--realtime", "80", "--raw-samples", "--freq", "2000"];

/// Build the on-device record command line.
///
/// `--event <joined categories>` is appended iff `categories` is non-empty.
fn record_command(perf_binary: &str, output_path: &str, categories: &[String]) -> Vec<String> {
    let mut cmd: Vec<String> = vec![
        perf_binary.to_string(),
        "record".to_string(),
        "--output".to_string(),
        output_path.to_string(),
    ];
    cmd.extend(RECORD_OPTIONS.iter().map(|flag| (*flag).to_string()));
    if !categories.is_empty() {
        cmd.push("--event".to_string());
        cmd.push(categories.join(","));
    }
    cmd
}

/// One profiling run on one device.
pub struct RemoteSession<'d> {
    device: &'d dyn Device,
    output_file: Box<dyn RemoteTempFile>,
    log_file: NamedTempFile,
    process: Box<dyn RemoteProcess>,
    profiler_name: String,
    stop_timeout: Duration,
    stopped: bool,
}

impl<'d> RemoteSession<'d> {
    /// Spawn the profiler and return immediately; sampling continues in the
    /// background until [`signal_and_wait`](Self::signal_and_wait).
    pub fn start(
        device: &'d dyn Device,
        perf_binary: &str,
        categories: &[String],
        stop_timeout: Duration,
    ) -> Result<Self> {
        let output_file = device.create_remote_temp_file("perf_output")?;
        let log_file =
            NamedTempFile::new().context("Failed to create the session log buffer")?;

        let cmd = record_command(perf_binary, output_file.name(), categories);
        log::info!(
            "starting profiler on {}: {}",
            device.id(),
            shlex::try_join(cmd.iter().map(String::as_str)).unwrap_or_default()
        );

        let log_handle = log_file
            .as_file()
            .try_clone()
            .context("Failed to clone the session log buffer handle")?;
        let process = device.spawn_shell(&cmd, log_handle)?;

        let profiler_name = Path::new(perf_binary)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("perf")
            .to_string();

        Ok(Self { device, output_file, log_file, process, profiler_name, stop_timeout, stopped: false })
    }

    /// Ask the profiler to stop gracefully and wait for the driving process
    /// to exit.
    ///
    /// SIGINT lets perf flush its output file before exiting. The wait is
    /// bounded by the configured stop timeout; on expiry the driving
    /// process is killed and [`ProfilerError::StopTimeout`] is returned.
    /// Calling this again after a successful stop is a no-op.
    pub fn signal_and_wait(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }

        let pids = self.device.extract_pids(&self.profiler_name)?;
        if pids.is_empty() {
            log::warn!(
                "no running '{}' process found on {}",
                self.profiler_name,
                self.device.id()
            );
        } else {
            let pid_list =
                pids.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
            self.device.run_shell_command(&format!("kill -SIGINT {pid_list}"))?;
        }

        match self.process.wait_timeout(self.stop_timeout)? {
            Some(code) => {
                if code != 0 {
                    log::warn!("profiler driver exited with status {code}");
                }
                self.stopped = true;
                Ok(())
            }
            None => {
                self.process.kill()?;
                Err(ProfilerError::StopTimeout { timeout: self.stop_timeout }.into())
            }
        }
    }

    /// Whether the profiler has been stopped and the trace is ready to pull.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Everything the profiler wrote to its combined stdout/stderr so far.
    /// Attached to every trace-retrieval failure.
    fn log_contents(&mut self) -> String {
        let mut text = String::new();
        let file = self.log_file.as_file_mut();
        if file.seek(SeekFrom::Start(0)).is_ok() {
            let _ = file.read_to_string(&mut text);
        }
        text
    }

    /// Copy the recorded trace into `dest_dir` under its remote base name.
    ///
    /// One-shot: consumes the session, releasing the log buffer and the
    /// remote temp file on every path out of here. A missing remote file or
    /// a zero-byte copy fails with the captured log attached; the zero-byte
    /// copy is deleted first.
    pub fn pull_result(mut self, dest_dir: &Path) -> Result<CapturedTrace> {
        if !self.device.file_exists(self.output_file.name())? {
            return Err(ProfilerError::TraceMissing { log: self.log_contents() }.into());
        }

        let basename = Path::new(self.output_file.name())
            .file_name()
            .context("remote output path has no base name")?;
        let local_path = dest_dir.join(basename);
        self.device.pull_file(self.output_file.name(), &local_path)?;

        let len = std::fs::metadata(&local_path)
            .with_context(|| format!("Failed to stat pulled trace {}", local_path.display()))?
            .len();
        if len == 0 {
            let _ = std::fs::remove_file(&local_path);
            return Err(ProfilerError::TraceEmpty { log: self.log_contents() }.into());
        }

        self.output_file.close()?;
        // the log buffer is a NamedTempFile and unlinks as `self` drops
        Ok(CapturedTrace { path: local_path, len })
    }
}
