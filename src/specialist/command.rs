//! Subprocess specialist.
//!
//! Runs `sh -c <command>` in its own process group, writes the request text
//! to stdin, and returns stdout without its trailing newlines as a text reply. A non-zero exit is a
//! [`SpecialistError::Failed`] carrying the tail of stderr.
//!
//! If the invocation future is dropped (timeout or cancellation), the whole
//! process group is killed with SIGKILL and `kill_on_drop` reaps the child.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Specialist;
use crate::dispatch::types::SpecialistRequest;
use crate::error::SpecialistError;

/// Maximum number of stderr characters kept in a failure message.
const STDERR_TAIL_CHARS: usize = 500;

pub struct CommandSpecialist {
    name: String,
    command: String,
    working_dir: Option<PathBuf>,
}

impl CommandSpecialist {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    async fn run(&self, request: SpecialistRequest) -> Result<Value, SpecialistError> {
        // process_group(0) requires the CommandExt trait on Unix.
        #[allow(unused_imports)]
        use std::os::unix::process::CommandExt;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .process_group(0)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| SpecialistError::SpawnFailed {
            name: self.name.clone(),
            message: e.to_string(),
        })?;
        let mut group = ProcessGroupGuard::new(child.id());

        let mut stdin = child.stdin.take().ok_or_else(|| SpecialistError::SpawnFailed {
            name: self.name.clone(),
            message: "failed to capture stdin".to_string(),
        })?;
        let input = request.into_text();

        // Feed stdin while collecting output so neither pipe can fill up.
        let write = async move {
            let result = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
            result
        };
        let (write_result, output) = tokio::join!(write, child.wait_with_output());
        group.disarm();

        let output = output.map_err(|e| SpecialistError::Failed {
            name: self.name.clone(),
            message: format!("process wait failed: {e}"),
        })?;

        if let Err(e) = write_result {
            // A specialist may exit without reading its input.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                tracing::warn!(specialist = %self.name, error = %e, "Failed to write request to specialist stdin");
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or("unknown".to_string(), |c| c.to_string());
            return Err(SpecialistError::Failed {
                name: self.name.clone(),
                message: format!("exited with code {code}: {}", tail(stderr.trim(), STDERR_TAIL_CHARS)),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| SpecialistError::Failed {
            name: self.name.clone(),
            message: "stdout is not valid UTF-8".to_string(),
        })?;

        // Only line terminators go; trailing spaces can be a Markdown hard break.
        Ok(Value::String(stdout.trim_end_matches(['\n', '\r']).to_string()))
    }
}

impl Specialist for CommandSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, request: SpecialistRequest) -> BoxFuture<'_, Result<Value, SpecialistError>> {
        Box::pin(self.run(request))
    }
}

/// Kills the specialist's process group when dropped while still armed.
struct ProcessGroupGuard {
    pid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            let pgid = nix::unistd::Pid::from_raw(pid as i32);
            let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL);
        }
    }
}

/// Keep the last `max_chars` characters of `s`, prefixed with "..." if cut.
fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count > max_chars {
        let skipped: String = s.chars().skip(count - max_chars).collect();
        format!("...{skipped}")
    } else {
        s.to_string()
    }
}
