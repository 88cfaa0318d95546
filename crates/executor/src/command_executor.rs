use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::limits::ResourceLimits;

const DEFAULT_SHELL: &str = "/bin/sh";
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Spawn failed: {0}")]
    Spawn(std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A shell invocation. Never built by interpolating untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellCommand(String);

impl ShellCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShellCommand {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitInfo {
    Code(i32),
    Signal(i32),
    Spawn(String),
    Io(String),
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitInfo::Code(code) => write!(f, "exit code {}", code),
            ExitInfo::Signal(signal) => write!(f, "killed by signal {}", signal),
            ExitInfo::Spawn(reason) => write!(f, "spawn failed: {}", reason),
            ExitInfo::Io(reason) => write!(f, "io error: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success { stdout: String, duration_ms: u64 },
    TimedOut { timeout_ms: u64 },
    Failed { stderr: String, exit_info: ExitInfo },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn stdout(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Success { stdout, .. } => Some(stdout),
            _ => None,
        }
    }
}

/// Runs one shell command under a wall-clock bound.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ShellCommand, timeout: Duration) -> ExecutionOutcome;
}

/// Kills the child's whole process group when dropped or told to.
struct GroupGuard {
    pgid: Option<i32>,
}

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|p| i32::try_from(p).ok()),
        }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            // ESRCH just means the group already exited.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[derive(Debug, Clone)]
pub struct Executor {
    shell: String,
    limits: ResourceLimits,
    max_output_bytes: usize,
}

impl Executor {
    pub fn new(shell: impl Into<String>, limits: ResourceLimits, max_output_bytes: usize) -> Self {
        Self {
            shell: shell.into(),
            limits,
            max_output_bytes,
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    fn spawn(&self, command: &ShellCommand) -> Result<Child, ExecutorError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // New session so the whole pipeline shares one killable group.
        #[cfg(unix)]
        {
            let limits = self.limits.clone();
            unsafe {
                cmd.pre_exec(move || {
                    if libc::setsid() == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    limits.apply()
                });
            }
        }

        cmd.spawn().map_err(ExecutorError::Spawn)
    }

    async fn collect(
        &self,
        child: &mut Child,
    ) -> Result<(Vec<u8>, Vec<u8>, std::process::ExitStatus), ExecutorError> {
        let cap = self.max_output_bytes;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out = async move {
            match stdout {
                Some(stream) => read_capped(stream, cap).await,
                None => Ok(Vec::new()),
            }
        };
        let err = async move {
            match stderr {
                Some(stream) => read_capped(stream, cap).await,
                None => Ok(Vec::new()),
            }
        };

        let (out, err, status) = tokio::join!(out, err, child.wait());
        Ok((out?, err?, status?))
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL, ResourceLimits::default(), DEFAULT_MAX_OUTPUT_BYTES)
    }
}

#[async_trait]
impl CommandRunner for Executor {
    async fn run(&self, command: &ShellCommand, timeout: Duration) -> ExecutionOutcome {
        let started = Instant::now();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        info!("Executing command: {} (timeout {}ms)", command, timeout_ms);

        let mut child = match self.spawn(command) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", self.shell, e);
                return ExecutionOutcome::Failed {
                    stderr: e.to_string(),
                    exit_info: ExitInfo::Spawn(e.to_string()),
                };
            }
        };
        let mut guard = GroupGuard::new(child.id());

        let collected = tokio::time::timeout(timeout, self.collect(&mut child)).await;

        let (stdout, stderr, status) = match collected {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                guard.kill();
                reap(&mut child).await;
                warn!("Lost contact with child of {}: {}", command, e);
                return ExecutionOutcome::Failed {
                    stderr: e.to_string(),
                    exit_info: ExitInfo::Io(e.to_string()),
                };
            }
            Err(_) => {
                guard.kill();
                reap(&mut child).await;
                warn!("Command timed out after {}ms: {}", timeout_ms, command);
                return ExecutionOutcome::TimedOut { timeout_ms };
            }
        };

        // Background jobs left behind by the shell die with the group.
        guard.kill();

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let stderr = String::from_utf8_lossy(&stderr).trim_end().to_string();

        if status.success() {
            if !stderr.is_empty() {
                debug!("stderr from successful command {}: {}", command, stderr);
            }
            return ExecutionOutcome::Success {
                stdout: String::from_utf8_lossy(&stdout).trim_end().to_string(),
                duration_ms,
            };
        }

        let exit_info = match status.code() {
            Some(code) => ExitInfo::Code(code),
            None => signal_of(&status),
        };
        warn!("Command failed with {}: {}", exit_info, command);
        ExecutionOutcome::Failed { stderr, exit_info }
    }
}

async fn reap(child: &mut Child) {
    let _ = child.start_kill();
    let _ = child.wait().await;
}

#[cfg(unix)]
fn signal_of(status: &std::process::ExitStatus) -> ExitInfo {
    use std::os::unix::process::ExitStatusExt;
    ExitInfo::Signal(status.signal().unwrap_or(-1))
}

#[cfg(not(unix))]
fn signal_of(_status: &std::process::ExitStatus) -> ExitInfo {
    ExitInfo::Signal(-1)
}

/// Drains the stream to EOF but keeps at most `cap` bytes, so a chatty child
/// never blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> std::io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_info_display() {
        assert_eq!(ExitInfo::Code(2).to_string(), "exit code 2");
        assert_eq!(ExitInfo::Signal(9).to_string(), "killed by signal 9");
        assert!(ExitInfo::Spawn("nope".into()).to_string().contains("nope"));
    }

    #[test]
    fn test_shell_command_is_transparent() {
        let command = ShellCommand::from("df -h");
        assert_eq!(command.as_str(), "df -h");
        assert_eq!(command.to_string(), "df -h");
    }

    #[test]
    fn test_outcome_stdout_only_on_success() {
        let ok = ExecutionOutcome::Success {
            stdout: "x".into(),
            duration_ms: 1,
        };
        assert_eq!(ok.stdout(), Some("x"));
        assert!(ExecutionOutcome::TimedOut { timeout_ms: 5 }.stdout().is_none());
    }

    #[tokio::test]
    async fn test_read_capped_discards_overflow() {
        let data: &[u8] = b"abcdefghij";
        let kept = read_capped(data, 4).await.unwrap();
        assert_eq!(kept, b"abcd");
    }
}
