//! Shared test doubles for the collaborator traits.
//!
//! `FakeDevice` scripts one profiling run: what the remote output file
//! contains, what the profiler writes to its log, and how the driving
//! process exits. `FakeHelper` and `FakeResolver` record the calls the
//! pipeline makes so tests can assert on them.

#![allow(dead_code)] // not every test file uses every fake

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use perfdrive::device::{Device, RemoteProcess, RemoteTempFile};
use perfdrive::domain::Pid;
use perfdrive::toolchain::{BinaryResolver, ProfilingHelper};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct FakeTempFile {
    name: String,
    closed: Rc<Cell<bool>>,
}

impl RemoteTempFile for FakeTempFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

pub struct FakeProcess {
    exit_code: Option<i32>,
    killed: Rc<Cell<bool>>,
}

impl RemoteProcess for FakeProcess {
    fn wait(&mut self) -> Result<i32> {
        self.exit_code.ok_or_else(|| anyhow!("driver process never exits"))
    }

    fn wait_timeout(&mut self, _timeout: Duration) -> Result<Option<i32>> {
        Ok(self.exit_code)
    }

    fn kill(&mut self) -> Result<()> {
        self.killed.set(true);
        Ok(())
    }
}

pub struct FakeDevice {
    /// Contents of the remote output file; `None` means perf never wrote it.
    pub trace_bytes: Option<Vec<u8>>,
    /// What the profiler process "writes" to its log.
    pub log_output: String,
    /// Exit code of the driving process; `None` simulates a hang.
    pub driver_exit: Option<i32>,
    /// Pids reported for the profiler process name.
    pub pids: Vec<Pid>,

    pub shell_commands: RefCell<Vec<String>>,
    pub spawned_commands: RefCell<Vec<Vec<String>>>,
    pub pull_count: Cell<u32>,
    pub temp_file_closed: Rc<Cell<bool>>,
    pub driver_killed: Rc<Cell<bool>>,
}

impl FakeDevice {
    /// A device whose run records 1024 bytes of trace and stops cleanly.
    pub fn healthy() -> Self {
        Self {
            trace_bytes: Some(vec![0xAB; 1024]),
            log_output: "perf record: captured and wrote 1024 bytes\n".to_string(),
            driver_exit: Some(0),
            pids: vec![Pid(42)],
            shell_commands: RefCell::new(Vec::new()),
            spawned_commands: RefCell::new(Vec::new()),
            pull_count: Cell::new(0),
            temp_file_closed: Rc::new(Cell::new(false)),
            driver_killed: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_trace_bytes(mut self, bytes: Option<Vec<u8>>) -> Self {
        self.trace_bytes = bytes;
        self
    }

    pub fn with_log_output(mut self, log: &str) -> Self {
        self.log_output = log.to_string();
        self
    }

    pub fn with_driver_exit(mut self, exit: Option<i32>) -> Self {
        self.driver_exit = exit;
        self
    }

    pub fn with_pids(mut self, pids: Vec<Pid>) -> Self {
        self.pids = pids;
        self
    }

    /// The single record command spawned on this device.
    pub fn spawned_command(&self) -> Vec<String> {
        let spawned = self.spawned_commands.borrow();
        assert_eq!(spawned.len(), 1, "expected exactly one spawned command");
        spawned[0].clone()
    }
}

impl Device for FakeDevice {
    fn id(&self) -> &str {
        "fake-0042"
    }

    fn run_shell_command(&self, cmd: &str) -> Result<Vec<String>> {
        self.shell_commands.borrow_mut().push(cmd.to_string());
        if cmd.ends_with(" list") {
            return Ok(vec!["cpu-cycles".to_string(), "sched".to_string()]);
        }
        Ok(Vec::new())
    }

    fn extract_pids(&self, _process_name: &str) -> Result<Vec<Pid>> {
        Ok(self.pids.clone())
    }

    fn file_exists(&self, _remote_path: &str) -> Result<bool> {
        Ok(self.trace_bytes.is_some())
    }

    fn pull_file(&self, _remote_path: &str, local_path: &Path) -> Result<()> {
        self.pull_count.set(self.pull_count.get() + 1);
        let bytes =
            self.trace_bytes.as_ref().ok_or_else(|| anyhow!("remote file does not exist"))?;
        std::fs::write(local_path, bytes)?;
        Ok(())
    }

    fn create_remote_temp_file(&self, prefix: &str) -> Result<Box<dyn RemoteTempFile>> {
        Ok(Box::new(FakeTempFile {
            name: format!("/data/local/tmp/{prefix}-1337"),
            closed: Rc::clone(&self.temp_file_closed),
        }))
    }

    fn spawn_shell(&self, cmd: &[String], mut log: File) -> Result<Box<dyn RemoteProcess>> {
        self.spawned_commands.borrow_mut().push(cmd.to_vec());
        log.write_all(self.log_output.as_bytes())?;
        Ok(Box::new(FakeProcess {
            exit_code: self.driver_exit,
            killed: Rc::clone(&self.driver_killed),
        }))
    }
}

pub struct FakeHelper {
    pub available: bool,
    pub libs: BTreeSet<String>,
    pub build_types_seen: RefCell<Vec<String>>,
    pub symfs_calls: RefCell<Vec<(PathBuf, BTreeSet<String>, bool)>>,
}

impl FakeHelper {
    pub fn new() -> Self {
        let libs: BTreeSet<String> =
            ["/system/lib64/libc.so", "/system/lib64/libandroid_runtime.so"]
                .iter()
                .map(ToString::to_string)
                .collect();
        Self {
            available: true,
            libs,
            build_types_seen: RefCell::new(Vec::new()),
            symfs_calls: RefCell::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self { available: false, ..Self::new() }
    }

    pub fn with_libs(mut self, libs: BTreeSet<String>) -> Self {
        self.libs = libs;
        self
    }
}

impl ProfilingHelper for FakeHelper {
    fn is_available(&self) -> bool {
        self.available
    }

    fn prepare_device_for_perf(&self, _device: &dyn Device, build_type: &str) -> Result<String> {
        self.build_types_seen.borrow_mut().push(build_type.to_string());
        Ok("/data/local/tmp/perf".to_string())
    }

    fn required_libraries(&self, _trace: &Path) -> Result<BTreeSet<String>> {
        Ok(self.libs.clone())
    }

    fn create_symfs(
        &self,
        _device: &dyn Device,
        symfs_dir: &Path,
        libs: &BTreeSet<String>,
        use_symlinks: bool,
    ) -> Result<PathBuf> {
        self.symfs_calls.borrow_mut().push((
            symfs_dir.to_path_buf(),
            libs.clone(),
            use_symlinks,
        ));
        let kallsyms = symfs_dir.join("kallsyms");
        std::fs::write(&kallsyms, "ffffffffc0000000 t fake_module_init\n")?;
        Ok(kallsyms)
    }
}

pub struct FakeResolver {
    pub perfhost: PathBuf,
    pub script: PathBuf,
    pub requests: RefCell<Vec<(String, String)>>,
}

impl FakeResolver {
    /// Resolver backed by a scripted stand-in converter in `dir`.
    pub fn with_converter(dir: &Path, converter: PathBuf) -> Self {
        let script = dir.join("perf_to_tracing.py");
        std::fs::write(&script, "# conversion script stand-in\n").unwrap();
        Self { perfhost: converter, script, requests: RefCell::new(Vec::new()) }
    }
}

impl BinaryResolver for FakeResolver {
    fn find_platform_binary(&self, name: &str, platform: &str) -> Result<PathBuf> {
        self.requests.borrow_mut().push((name.to_string(), platform.to_string()));
        match name {
            "perfhost" => Ok(self.perfhost.clone()),
            "perf_to_tracing.py" => Ok(self.script.clone()),
            other => Err(anyhow!("no prebuilt binary named {other}")),
        }
    }
}

/// Write an executable stand-in converter into `dir`.
///
/// The script appends its arguments to `args.txt` next to itself, prints
/// `stdout_line` and exits with `exit_code`, which is enough to exercise
/// the invocation contract without a real perfhost build.
#[cfg(unix)]
pub fn write_fake_converter(dir: &Path, stdout_line: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let args_file = dir.join("args.txt");
    let path = dir.join("perfhost");
    let body = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\nif [ -n \"{stdout_line}\" ]; then printf '%s\\n' \"{stdout_line}\"; fi\nexit {exit_code}\n",
        args_file.display()
    );
    std::fs::write(&path, body).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Arguments the fake converter was invoked with, one per line.
pub fn recorded_converter_args(dir: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(dir.join("args.txt")).unwrap_or_default();
    text.lines().map(ToString::to_string).collect()
}
