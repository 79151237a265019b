//! Interpreter-backed executor.
//!
//! Runs `argv = [interpreter, scratch-file]` with stdin closed and
//! stdout/stderr captured separately. One wall-clock deadline covers both
//! the child's exit and draining its output pipes; on timeout the child's
//! process group is killed and the child reaped.

use crate::config::SandboxConfig;
use crate::sandbox::executor::{extension_for_language, ExecutionReport, Executor};
use crate::sandbox::scratch::ScratchDir;
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Executor that hands a scratch source file to an interpreter binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptExecutor {
    language: String,
    extension: String,
    interpreter: PathBuf,
    timeout: Duration,
}

impl ScriptExecutor {
    /// Creates an executor for `language` using the known extension map.
    pub fn new(
        language: impl Into<String>,
        interpreter: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        let language = language.into().trim().to_ascii_lowercase();
        let extension = extension_for_language(&language).to_string();
        Self {
            language,
            extension,
            interpreter: interpreter.into(),
            timeout,
        }
    }

    /// Built-in `python` executor configured from sandbox settings.
    pub fn python(config: &SandboxConfig) -> Self {
        Self::new("python", config.python_interpreter.clone(), config.timeout)
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Executor for ScriptExecutor {
    fn language(&self) -> &str {
        &self.language
    }

    fn file_extension(&self) -> &str {
        &self.extension
    }

    fn run(&self, code: &str, scratch: &ScratchDir) -> ExecutionReport {
        let file = match scratch.write(code, &self.extension) {
            Ok(file) => file,
            Err(err) => return ExecutionReport::launch_failed(err),
        };
        // `file` lives until the end of this scope, covering every exit path.
        run_with_timeout(&self.interpreter, file.path(), self.timeout)
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn run_with_timeout(interpreter: &Path, script: &Path, timeout: Duration) -> ExecutionReport {
    let mut command = Command::new(interpreter);
    command
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Own group, so background jobs started by the code die with it.
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut command, 0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return ExecutionReport::launch_failed(format!(
                "failed to start `{}`: {err}",
                interpreter.display()
            ))
        }
    };

    let deadline = Instant::now() + timeout;
    let (sender, receiver) = mpsc::channel();
    let mut pending = 0;
    pending += spawn_reader(child.stdout.take(), Stream::Stdout, &sender);
    pending += spawn_reader(child.stderr.take(), Stream::Stderr, &sender);
    drop(sender);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    terminate(&mut child);
                    return ExecutionReport::timed_out(timeout);
                }
                thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
            Err(err) => {
                terminate(&mut child);
                return ExecutionReport::launch_failed(err);
            }
        }
    };

    let Some((stdout, stderr)) = collect_output(&receiver, pending, deadline) else {
        // Exited, but a background process still holds the pipes open.
        kill_process_group(child.id());
        return ExecutionReport::timed_out(timeout);
    };
    if status.success() {
        ExecutionReport::completed(stdout)
    } else {
        ExecutionReport::failed(status.code(), &stderr)
    }
}

/// Waits for `pending` reader results until `deadline`. `None` on timeout.
fn collect_output(
    receiver: &Receiver<(Stream, String)>,
    pending: usize,
    deadline: Instant,
) -> Option<(String, String)> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    for _ in 0..pending {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok((Stream::Stdout, text)) => stdout = text,
            Ok((Stream::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Some((stdout, stderr))
}

fn terminate(child: &mut Child) {
    kill_process_group(child.id());
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg takes plain integers and touches no memory; the group
    // id is the child's pid, set by `process_group(0)` at spawn.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "event=sandbox_kill module=sandbox status=ignored pgid={} error={}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Starts a thread that drains `source` and sends the text once. Returns the
/// number of results to expect.
fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
    stream: Stream,
    sender: &Sender<(Stream, String)>,
) -> usize {
    let Some(mut source) = source else {
        return 0;
    };
    let sender = sender.clone();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = source.read_to_end(&mut buffer);
        let _ = sender.send((stream, String::from_utf8_lossy(&buffer).into_owned()));
    });
    1
}

#[cfg(test)]
mod tests {
    use super::ScriptExecutor;
    use crate::config::SandboxConfig;
    use crate::sandbox::executor::Executor;
    use std::time::Duration;

    #[test]
    fn python_executor_uses_config() {
        let config = SandboxConfig::default()
            .with_python_interpreter("/opt/python/bin/python3")
            .with_timeout(Duration::from_secs(2));
        let executor = ScriptExecutor::python(&config);

        assert_eq!(executor.language(), "python");
        assert_eq!(executor.file_extension(), "py");
        assert_eq!(executor.timeout(), Duration::from_secs(2));
        assert_eq!(
            executor.interpreter(),
            std::path::Path::new("/opt/python/bin/python3")
        );
    }

    #[test]
    fn extension_override_strips_dot() {
        let executor = ScriptExecutor::new(" Shell ", "sh", Duration::from_secs(1))
            .with_extension(".sh");
        assert_eq!(executor.language(), "shell");
        assert_eq!(executor.file_extension(), "sh");
    }
}
