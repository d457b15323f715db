use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::utils::error::{DiagramError, ErrorKind, Result};

/// One external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`
    pub dir: Option<PathBuf>,
    /// Written to the child's stdin, which is then closed
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
            stdin: None,
            timeout,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stderr, or a description of the exit status when stderr is empty
    pub fn failure_detail(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr).trim().to_string();
        if !stderr.is_empty() {
            return stderr;
        }
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Seam between the tool adapters and the operating system.
///
/// A timed out invocation reports `io::ErrorKind::TimedOut`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Location of `program` on PATH
    fn find_program(&self, program: &str) -> Option<PathBuf>;

    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Runs real processes with Tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    fn find_program(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.dir {
            command.current_dir(dir);
        }

        tracing::debug!(program = %invocation.program, args = ?invocation.args, "spawning");
        let mut child = command.spawn()?;

        let feed = invocation.stdin.as_deref().zip(child.stdin.take());
        let write_stdin = async move {
            if let Some((input, mut pipe)) = feed {
                match pipe.write_all(input.as_bytes()).await {
                    // The child may exit without reading all of its input
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok::<(), io::Error>(())
        };
        let finish = async move {
            let (written, output) = tokio::join!(write_stdin, child.wait_with_output());
            written?;
            output
        };

        // Dropping the pending future drops the child, which kills it
        let output = tokio::time::timeout(invocation.timeout, finish)
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{} did not finish within {:?}", invocation.program, invocation.timeout),
                )
            })??;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Run a tool, mapping spawn failures, timeouts and non-zero exits to `kind`.
///
/// `label` names the command in messages, e.g. `swift package dump-package`.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    kind: ErrorKind,
    label: &str,
) -> Result<CommandOutput> {
    match runner.run(invocation).await {
        Ok(output) if output.success => Ok(output),
        Ok(output) => Err(DiagramError::new(
            kind,
            format!("{label} failed: {}", output.failure_detail()),
        )),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => {
            Err(DiagramError::new(kind, format!("{label} timed out")).with_source(e))
        }
        Err(e) => Err(DiagramError::new(kind, format!("{label} failed")).with_source(e)),
    }
}
