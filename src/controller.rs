//! Profiling session lifecycle.
//!
//! `SessionController` sequences prepare -> start -> stop -> pull across a
//! single borrowed device, holds at most one [`RemoteSession`] at a time,
//! and enforces the ordering invariants the rest of the crate relies on.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::device::Device;
use crate::domain::ProfilerError;
use crate::preflight::CapabilityProbe;
use crate::session::RemoteSession;
use crate::symbolization::SymbolizationPipeline;
use crate::toolchain::{BinaryResolver, ProfilingHelper};

/// Tunables for a profiling controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Helper build artifacts to push; `"Release"` when `None`.
    pub build_type: Option<String>,
    /// How long to wait for the profiler to flush and exit after SIGINT.
    pub stop_timeout: Duration,
    /// Symbol filesystem cache directory; a per-user temp dir when `None`.
    pub symfs_dir: Option<PathBuf>,
    /// Where the converted artifact is written.
    pub output_dir: PathBuf,
    /// Host platform the converter binary is resolved for.
    pub platform: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            build_type: None,
            stop_timeout: Duration::from_secs(60),
            symfs_dir: None,
            output_dir: PathBuf::from("."),
            platform: "linux".to_string(),
        }
    }
}

/// Common surface of tracing controllers.
pub trait TraceController {
    /// Identity for log messages.
    fn name(&self) -> &'static str;
    fn start_tracing(&mut self, categories: &[String]) -> Result<()>;
    fn stop_tracing(&mut self) -> Result<()>;
    fn pull_trace(&mut self) -> Result<PathBuf>;
}

/// Drives perf profiling sessions on one device.
pub struct SessionController<'d> {
    device: &'d dyn Device,
    helper: &'d dyn ProfilingHelper,
    resolver: &'d dyn BinaryResolver,
    config: ControllerConfig,
    perf_binary: String,
    session: Option<RemoteSession<'d>>,
}

impl<'d> SessionController<'d> {
    /// Fails fast with [`ProfilerError::Unsupported`] when the helper
    /// toolchain is absent; otherwise prepares the device and keeps the
    /// on-device binary path for the sessions to come.
    pub fn new(
        device: &'d dyn Device,
        helper: &'d dyn ProfilingHelper,
        resolver: &'d dyn BinaryResolver,
        config: ControllerConfig,
    ) -> Result<Self> {
        let probe = CapabilityProbe::new(helper, config.build_type.clone());
        if !probe.is_supported() {
            return Err(ProfilerError::Unsupported.into());
        }
        let perf_binary = probe.prepare_device(device)?;
        Ok(Self { device, helper, resolver, config, perf_binary, session: None })
    }

    /// Whether profiling is usable at all in this environment.
    pub fn is_supported(helper: &dyn ProfilingHelper) -> bool {
        helper.is_available()
    }

    /// Supported sampling categories, as reported by the on-device binary.
    pub fn categories(&self) -> Result<Vec<String>> {
        self.device.run_shell_command(&format!("{} list", self.perf_binary))
    }

    /// Start a new profiling session. At most one session runs at a time;
    /// a second call while one is outstanding returns
    /// [`ProfilerError::SessionActive`].
    pub fn start_tracing(&mut self, categories: &[String]) -> Result<()> {
        if self.session.is_some() {
            return Err(ProfilerError::SessionActive.into());
        }
        let session = RemoteSession::start(
            self.device,
            &self.perf_binary,
            categories,
            self.config.stop_timeout,
        )?;
        self.session = Some(session);
        Ok(())
    }

    /// Stop the current session. A no-op when no session was ever started.
    pub fn stop_tracing(&mut self) -> Result<()> {
        match self.session.as_mut() {
            None => Ok(()),
            Some(session) => session.signal_and_wait(),
        }
    }

    /// Pull the recorded trace, symbolize it and convert it; returns the
    /// path of the converted artifact. Only valid after a completed
    /// [`stop_tracing`](Self::stop_tracing); the session is released.
    pub fn pull_trace(&mut self) -> Result<PathBuf> {
        let Some(session) = self.session.take() else {
            return Err(ProfilerError::NoStoppedSession.into());
        };
        if !session.is_stopped() {
            self.session = Some(session);
            return Err(ProfilerError::SessionNotStopped.into());
        }

        let symfs_dir = self.ensure_symfs_dir()?;
        let pipeline = SymbolizationPipeline::new(
            self.helper,
            self.resolver,
            &self.config.platform,
            &self.config.output_dir,
        );
        pipeline.run(session, self.device, &symfs_dir)
    }

    /// Per-user symfs cache directory, created if absent and intentionally
    /// never cleared: reusing it across sessions saves re-pulling device
    /// libraries.
    fn ensure_symfs_dir(&self) -> Result<PathBuf> {
        let dir = match &self.config.symfs_dir {
            Some(dir) => dir.clone(),
            None => default_symfs_dir(),
        };
        if dir.is_dir() {
            log::debug!("reusing symfs cache at {}", dir.display());
        } else {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create symfs dir {}", dir.display()))?;
        }
        Ok(dir)
    }
}

impl fmt::Display for SessionController<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "perf profile")
    }
}

impl TraceController for SessionController<'_> {
    fn name(&self) -> &'static str {
        "perf profile"
    }

    fn start_tracing(&mut self, categories: &[String]) -> Result<()> {
        SessionController::start_tracing(self, categories)
    }

    fn stop_tracing(&mut self) -> Result<()> {
        SessionController::stop_tracing(self)
    }

    fn pull_trace(&mut self) -> Result<PathBuf> {
        SessionController::pull_trace(self)
    }
}

fn default_symfs_dir() -> PathBuf {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "perf".to_string());
    std::env::temp_dir().join(format!("{user}-perf-symfs"))
}
