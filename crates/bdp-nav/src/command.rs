//! Builder for running external tools (ffprobe, ffmpeg).

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bdp_core::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default timeout for captured invocations: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use bdp_nav::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> bdp_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
///     .args(["-playlist", "1", "bluray:/mnt/disc"])
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
    stdin_data: Option<Vec<u8>>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            stdin_data: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time, or `None` to wait indefinitely.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The execution limit; `None` waits indefinitely.
    pub fn time_limit(&self) -> Option<Duration> {
        self.timeout
    }

    /// Provide data to be written to the process's stdin.
    pub fn stdin(&mut self, data: Vec<u8>) -> &mut Self {
        self.stdin_data = Some(data);
        self
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    fn spawn(&self, capture: bool) -> bdp_core::Result<tokio::process::Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if self.stdin_data.is_some() {
            cmd.stdin(Stdio::piped());
        }
        if capture {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        }
        cmd.kill_on_drop(true);

        tracing::debug!(argv = ?self.argv(), "Spawning tool");
        cmd.spawn()
            .map_err(|e| Error::tool(self.program_name(), format!("failed to spawn: {e}")))
    }

    async fn feed_stdin(&self, child: &mut tokio::process::Child) -> bdp_core::Result<()> {
        if let (Some(data), Some(mut stdin)) = (&self.stdin_data, child.stdin.take()) {
            stdin
                .write_all(data)
                .await
                .map_err(|e| Error::tool(self.program_name(), format!("failed to write stdin: {e}")))?;
            // Dropping stdin closes the pipe so the child sees EOF.
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = std::io::Result<T>>,
    ) -> bdp_core::Result<T> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Error::tool(self.program_name(), format!("timed out after {limit:?}"))
            })?,
            None => fut.await,
        };
        result.map_err(|e| {
            Error::tool(
                self.program_name(),
                format!("I/O error waiting for process: {e}"),
            )
        })
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning fails, the process times out, or
    /// it exits with a non-zero status (message includes stderr).
    pub async fn execute(&self) -> bdp_core::Result<ToolOutput> {
        let mut child = self.spawn(true)?;
        self.feed_stdin(&mut child).await?;
        let output = self.bounded(child.wait_with_output()).await?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.status.success() {
            return Err(Error::tool(
                self.program_name(),
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }
        Ok(tool_output)
    }

    /// Start the command with this process's stdout and stderr and wait for
    /// it to finish.
    pub async fn run(&self) -> bdp_core::Result<ExitStatus> {
        let mut child = self.spawn(false)?;
        self.feed_stdin(&mut child).await?;
        let status = self.bounded(child.wait()).await?;
        if !status.success() {
            return Err(Error::tool(
                self.program_name(),
                format!("exited with status {status}"),
            ));
        }
        Ok(status)
    }
}
