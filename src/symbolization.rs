//! Trace symbolization and conversion pipeline.
//!
//! Orchestration only: which libraries a trace references and how to mirror
//! them into a symfs is the profiling helper's job. This module sequences
//! pull -> required libraries -> symfs -> conversion, and owns the external
//! converter invocation contract.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::device::Device;
use crate::domain::{CapturedTrace, ProfilerError};
use crate::session::RemoteSession;
use crate::toolchain::{BinaryResolver, ProfilingHelper};

/// Prebuilt host-side perf binary used for conversion.
const CONVERTER_BINARY: &str = "perfhost";
/// Conversion script shipped alongside the converter binary.
const CONVERTER_SCRIPT: &str = "perf_to_tracing.py";

/// Turns a stopped session's binary trace into a portable artifact.
pub struct SymbolizationPipeline<'a> {
    helper: &'a dyn ProfilingHelper,
    resolver: &'a dyn BinaryResolver,
    platform: &'a str,
    output_dir: &'a Path,
}

impl<'a> SymbolizationPipeline<'a> {
    pub fn new(
        helper: &'a dyn ProfilingHelper,
        resolver: &'a dyn BinaryResolver,
        platform: &'a str,
        output_dir: &'a Path,
    ) -> Self {
        Self { helper, resolver, platform, output_dir }
    }

    /// Run the full pipeline for a stopped session; returns the path of the
    /// converted artifact.
    pub fn run(
        &self,
        session: RemoteSession<'_>,
        device: &dyn Device,
        symfs_dir: &Path,
    ) -> Result<PathBuf> {
        let trace = session.pull_result(symfs_dir)?;
        log::info!("pulled {} byte trace to {}", trace.len, trace.path.display());

        let required_libs = self.helper.required_libraries(&trace.path)?;
        if required_libs.is_empty() {
            log::warn!(
                "No libraries required by perf trace. Most likely there \
                 are no samples in the trace."
            );
        }

        // Copies rather than symlinks: the symfs must survive being handed
        // to tools that do not follow links across filesystems.
        let kallsyms = self.helper.create_symfs(device, symfs_dir, &required_libs, false)?;

        let perfhost = self.resolver.find_platform_binary(CONVERTER_BINARY, self.platform)?;
        let script = self.resolver.find_platform_binary(CONVERTER_SCRIPT, self.platform)?;

        self.convert(&perfhost, &script, &trace, symfs_dir, &kallsyms)
    }

    /// Invoke the external converter with the trace, symfs and kernel
    /// symbol table.
    ///
    /// The argument list is a fixed contract with the converter binary and
    /// must not be reordered. Success requires a clean exit status and a
    /// non-empty output file; a partial file left behind by a failed run is
    /// removed rather than misreported as success.
    fn convert(
        &self,
        perfhost: &Path,
        script: &Path,
        trace: &CapturedTrace,
        symfs_dir: &Path,
        kallsyms: &Path,
    ) -> Result<PathBuf> {
        let out_path = self.output_dir.join(trace.basename());
        let out_file = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;

        let status = Command::new(perfhost)
            .arg("script")
            .arg("-s")
            .arg(script)
            .arg("-i")
            .arg(&trace.path)
            .arg("--symfs")
            .arg(symfs_dir)
            .arg("--kallsyms")
            .arg(kallsyms)
            .stdout(out_file)
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run converter {}", perfhost.display()))?;

        if !status.success() {
            let _ = std::fs::remove_file(&out_path);
            return Err(
                ProfilerError::ConverterFailed { status: status.code().unwrap_or(-1) }.into()
            );
        }

        let len = std::fs::metadata(&out_path).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            let _ = std::fs::remove_file(&out_path);
            return Err(ProfilerError::ConverterEmptyOutput { path: out_path }.into());
        }

        log::info!("converted trace written to {}", out_path.display());
        Ok(out_path)
    }
}
