// ABOUTME: Process spawning seam for the lifecycle manager.
// ABOUTME: CommandSpawner runs invocations with tokio; tests substitute their own.

use crate::compose::Invocation;
use async_trait::async_trait;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Lines of process output, stdout and stderr merged in arrival order.
pub type OutputLines = Pin<Box<dyn Stream<Item = String> + Send>>;

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A running child process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Take the output stream. Returns `None` after the first call.
    fn take_output(&mut self) -> Option<OutputLines>;

    /// Wait for the process to exit. Must be cancel-safe.
    async fn wait(&mut self) -> io::Result<ProcessExit>;

    /// Request forced termination without waiting for it.
    fn start_kill(&mut self) -> io::Result<()>;
}

/// Starts processes for a [`ContainerManager`](super::ContainerManager).
#[async_trait]
pub trait Spawner: Send + Sync {
    /// Spawn a long-running process with captured output.
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn ProcessHandle>>;

    /// Run a short command to completion, discarding its output.
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessExit>;
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpawner;

#[async_trait]
impl Spawner for CommandSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn ProcessHandle>> {
        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().map(line_stream);
        let stderr = child.stderr.take().map(line_stream);
        let output: OutputLines = match (stdout, stderr) {
            (Some(out), Some(err)) => Box::pin(futures::stream::select(out, err)),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => Box::pin(futures::stream::empty()),
        };

        Ok(Box::new(ChildProcess {
            child,
            output: Some(output),
        }))
    }

    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessExit> {
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            tracing::debug!(
                "{} stderr: {}",
                invocation.program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(ProcessExit {
            code: output.status.code(),
        })
    }
}

struct ChildProcess {
    child: tokio::process::Child,
    output: Option<OutputLines>,
}

#[async_trait]
impl ProcessHandle for ChildProcess {
    fn take_output(&mut self) -> Option<OutputLines> {
        self.output.take()
    }

    async fn wait(&mut self) -> io::Result<ProcessExit> {
        let status = self.child.wait().await?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Split a pipe into lines, tolerating invalid UTF-8 and CRLF endings.
fn line_stream<R>(reader: R) -> OutputLines
where
    R: AsyncRead + Unpin + Send + 'static,
{
    Box::pin(futures::stream::unfold(
        BufReader::new(reader),
        |mut reader| async move {
            let mut buf = Vec::new();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => None,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    Some((String::from_utf8_lossy(&buf).into_owned(), reader))
                }
                Err(e) => {
                    tracing::debug!("output pipe read failed: {}", e);
                    None
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn line_stream_splits_and_trims() {
        let input: &[u8] = b"first\r\nsecond\nlast without newline";
        let lines: Vec<String> = line_stream(input).collect().await;
        assert_eq!(lines, vec!["first", "second", "last without newline"]);
    }

    #[tokio::test]
    async fn line_stream_replaces_invalid_utf8() {
        let input: &[u8] = b"ok \xff\n";
        let lines: Vec<String> = line_stream(input).collect().await;
        assert_eq!(lines, vec!["ok \u{fffd}"]);
    }

    #[test]
    fn exit_success_requires_zero_code() {
        assert!(ProcessExit { code: Some(0) }.success());
        assert!(!ProcessExit { code: Some(1) }.success());
        assert!(!ProcessExit { code: None }.success());
    }
}
