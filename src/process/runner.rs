//! Subprocess execution with captured output and a hard timeout.

use crate::error::{Result, SkriftError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn, Instrument};

/// How long to wait for a killed process to be reaped, and for output pipes to
/// drain after a natural exit.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Outcome of a single process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code. `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the timeout elapsed and the process was killed.
    pub timed_out: bool,
}

impl ProcessResult {
    /// Process exited on its own with status 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Last non-empty stderr line, handy for short error messages.
    pub fn stderr_tail(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// Runs external commands without a shell.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args` and wait for it to finish or time out.
    ///
    /// Stdin is closed, stdout and stderr are captured line by line as the
    /// process runs. When `timeout` elapses the process is killed with SIGKILL
    /// and the result is returned right away with `timed_out` set and whatever
    /// output had been captured so far. The child is also killed if this future
    /// is dropped.
    #[instrument(skip_all, fields(program = %program))]
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<ProcessResult> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| SkriftError::ProcessSpawn {
            program: program.to_string(),
            source,
        })?;
        debug!(pid = ?child.id(), "Process spawned");

        let stdout = Arc::new(Mutex::new(String::new()));
        let stderr = Arc::new(Mutex::new(String::new()));
        let readers = [
            child.stdout.take().map(|pipe| spawn_reader(pipe, stdout.clone(), "stdout")),
            child.stderr.take().map(|pipe| spawn_reader(pipe, stderr.clone(), "stderr")),
        ];

        let waited = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let (exit_code, timed_out) = match waited {
            Some(status) => {
                let status = status?;
                for reader in readers.into_iter().flatten() {
                    drain(reader).await;
                }
                (status.code(), false)
            }
            None => {
                warn!("Process exceeded {:?}, killing", timeout.unwrap_or_default());
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill process: {}", e);
                }
                for reader in readers.into_iter().flatten() {
                    reader.abort();
                }
                if tokio::time::timeout(GRACE_PERIOD, child.wait()).await.is_err() {
                    warn!("Killed process was not reaped within {:?}", GRACE_PERIOD);
                }
                (None, true)
            }
        };

        let result = ProcessResult {
            exit_code,
            stdout: snapshot(&stdout),
            stderr: snapshot(&stderr),
            timed_out,
        };
        debug!(
            exit_code = ?result.exit_code,
            timed_out = result.timed_out,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "Process finished"
        );
        Ok(result)
    }
}

/// Accumulate a pipe into `sink` line by line until EOF.
fn spawn_reader<R>(pipe: R, sink: Arc<Mutex<String>>, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    debug!(stream, "{}", text.trim_end());
                    if let Ok(mut buf) = sink.lock() {
                        buf.push_str(&text);
                    }
                }
                Err(e) => {
                    warn!(stream, "Failed to read process output: {}", e);
                    break;
                }
            }
        }
    }
    .in_current_span())
}

/// Wait for a reader to hit EOF. A grandchild holding the pipe open must not
/// stall the caller, so give up after the grace period.
async fn drain(reader: JoinHandle<()>) {
    let abort = reader.abort_handle();
    if tokio::time::timeout(GRACE_PERIOD, reader).await.is_err() {
        warn!("Output pipe still open after process exit, abandoning it");
        abort.abort();
    }
}

fn snapshot(buf: &Mutex<String>) -> String {
    buf.lock().map(|b| b.clone()).unwrap_or_default()
}

/// Resolve a program the way the OS would when spawning it: paths are checked
/// directly, bare names are searched on `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| {
            let exe = dir.join(program);
            let with_ext = cfg!(windows).then(|| dir.join(format!("{}.exe", program)));
            std::iter::once(exe).chain(with_ext)
        })
        .find(|p| p.is_file())
}
