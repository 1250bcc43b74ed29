//! Exec tasks - shell commands speaking JSON
//!
//! The resolved inputs are written to the command's stdin as one JSON
//! object; stdout must be a JSON object (or empty) and becomes the task's
//! outputs. An optional undo command receives the task's outputs on stdin
//! during rollback.

use std::io::{self, Read, Write};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::chain::{canonicalize, Declaration, Task};
use crate::config::RunnerConfig;
use crate::error::{LinflowError, Result};
use crate::store::Outputs;

use super::step::Step;

/// Outcome of one shell invocation
#[derive(Debug)]
enum ShellOutcome {
    Finished { stdout: String },
    Failed { code: Option<i32>, stderr: String },
    TimedOut,
}

/// Run `<shell> -c <command>` feeding `stdin`, bounded by `timeout`
///
/// On Unix the shell leads its own process group, and a timeout kills the
/// whole group so nothing it started outlives the task.
fn run_shell(shell: &str, command: &str, stdin: Vec<u8>, timeout: Duration) -> io::Result<ShellOutcome> {
    let mut cmd = Command::new(shell);
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);
    let mut child = cmd.spawn()?;

    // Every pipe gets its own thread so neither side can stall the timeout
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);
    let stdin_writer = child.stdin.take().map(|pipe| spawn_writer(pipe, stdin));

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            kill_tree(&mut child);
            let _ = child.wait();
            return Ok(ShellOutcome::TimedOut);
        }
    };

    if let Some(writer) = stdin_writer {
        writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))?;
    }
    let stdout = stdout_reader.map(join_reader).unwrap_or_default();
    let stderr = stderr_reader.map(join_reader).unwrap_or_default();

    if status.success() {
        Ok(ShellOutcome::Finished { stdout })
    } else {
        Ok(ShellOutcome::Failed {
            code: status.code(),
            stderr,
        })
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // Negative pid targets the process group led by the shell
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_writer(mut pipe: ChildStdin, payload: Vec<u8>) -> thread::JoinHandle<io::Result<()>> {
    thread::spawn(move || match pipe.write_all(&payload) {
        // The command is free to ignore its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_reader(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Parse exec stdout into outputs (empty stdout → no outputs)
fn parse_outputs(task_id: &str, stdout: &str) -> Result<Outputs> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Outputs::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LinflowError::InvalidOutput {
            task_id: task_id.to_string(),
            details: format!("expected a JSON object, got {}", json_type(&other)),
        }),
        Err(e) => Err(LinflowError::InvalidOutput {
            task_id: task_id.to_string(),
            details: e.to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn failure_reason(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("command exited with code {}", code.unwrap_or(-1))
    } else {
        stderr.to_string()
    }
}

/// Shell command task
#[derive(Debug, Clone)]
pub struct ExecTask {
    id: Arc<str>,
    command: String,
    undo: Option<String>,
    shell: Arc<str>,
    timeout: Duration,
    requires: Declaration,
    provides: Declaration,
}

impl ExecTask {
    pub fn new(id: impl Into<Arc<str>>, command: impl Into<String>, config: &RunnerConfig) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            undo: None,
            shell: Arc::from(config.shell.as_str()),
            timeout: config.exec_timeout(),
            requires: Declaration::Absent,
            provides: Declaration::Absent,
        }
    }

    pub fn with_undo(mut self, undo: impl Into<String>) -> Self {
        self.undo = Some(undo.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_requires(mut self, requires: impl Into<Declaration>) -> Self {
        self.requires = requires.into();
        self
    }

    pub fn with_provides(mut self, provides: impl Into<Declaration>) -> Self {
        self.provides = provides.into();
        self
    }

    fn invoke(&self, command: &str, payload: &Outputs) -> Result<String> {
        let stdin = serde_json::to_vec(payload).map_err(|e| LinflowError::TaskFailed {
            task_id: self.id.to_string(),
            reason: format!("failed to encode stdin: {}", e),
        })?;

        let outcome = run_shell(&self.shell, command, stdin, self.timeout).map_err(|e| {
            LinflowError::TaskFailed {
                task_id: self.id.to_string(),
                reason: format!("failed to run command: {}", e),
            }
        })?;

        match outcome {
            ShellOutcome::Finished { stdout } => Ok(stdout),
            ShellOutcome::Failed { code, stderr } => Err(LinflowError::TaskFailed {
                task_id: self.id.to_string(),
                reason: failure_reason(code, &stderr),
            }),
            ShellOutcome::TimedOut => Err(LinflowError::TaskTimeout {
                task_id: self.id.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

impl Task for ExecTask {
    fn name(&self) -> &str {
        &self.id
    }

    fn declared_requires(&self) -> Declaration {
        self.requires.clone()
    }

    fn declared_provides(&self) -> Declaration {
        self.provides.clone()
    }
}

impl Step for ExecTask {
    fn kind(&self) -> &'static str {
        "exec"
    }

    #[instrument(skip(self, inputs), fields(task = %self.id))]
    fn execute(&self, inputs: &Outputs) -> Result<Outputs> {
        debug!(command = %self.command, "executing");
        let stdout = self.invoke(&self.command, inputs)?;
        let outputs = parse_outputs(&self.id, &stdout)?;

        let undelivered = canonicalize(self.provides.clone())
            .difference(&outputs.keys().map(String::as_str).collect());
        if !undelivered.is_empty() {
            warn!(missing = %undelivered, "command did not produce every declared output");
        }

        Ok(outputs)
    }

    #[instrument(skip(self, outputs), fields(task = %self.id))]
    fn revert(&self, outputs: &Outputs) -> Result<()> {
        let Some(undo) = &self.undo else {
            return Ok(());
        };
        debug!(command = %undo, "reverting");
        self.invoke(undo, outputs).map(|_| ())
    }
}
