use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::context::{LineConsumer, ProcessContext};
use crate::error::{ExecutorError, Result};
use crate::traits::ProcessExecutor;

/// [`ProcessExecutor`] backed by `tokio::process`.
///
/// Every invocation spawns two tasks on the current runtime, one per output
/// stream, so a child filling one pipe never blocks on the other. The child is
/// killed if the `execute` future is dropped before it finishes.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessExecutor;

impl TokioProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn execute(&self, context: ProcessContext) -> Result<i32> {
        check_working_directory(context.working_directory()).await?;

        let parts = context.into_parts();
        let logged_context = describe_context(
            &parts.command,
            &parts.working_directory,
            &parts.extra_env_variables,
        );
        info!(context = %logged_context, "Executing command");

        let mut child = Command::new(&parts.command[0])
            .args(&parts.command[1..])
            .current_dir(&parts.working_directory)
            .envs(&parts.extra_env_variables)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutorError::execution(format!("starting {}", parts.command[0]), e))?;

        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let stdout_drain = tokio::spawn(drain_lines(stdout, parts.stdout_consumer, "stdout"));
        let stderr_drain = tokio::spawn(drain_lines(stderr, parts.stderr_consumer, "stderr"));

        let status = child
            .wait()
            .await
            .map_err(|e| ExecutorError::execution("waiting for the process", e))?;

        let (stdout_lines, stderr_lines) = tokio::join!(
            join_drain(stdout_drain, "stdout"),
            join_drain(stderr_drain, "stderr")
        );
        let stdout_lines = stdout_lines?;
        let stderr_lines = stderr_lines?;

        let exit_code = exit_code(status);
        info!(
            context = %logged_context,
            exit_code,
            stdout_lines,
            stderr_lines,
            "Command terminated"
        );

        Ok(exit_code)
    }
}

async fn check_working_directory(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ExecutorError::InvalidArgument(format!(
            "{} is not a directory",
            path.display()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExecutorError::InvalidArgument(
            format!("Directory at the path {} does not exist", path.display()),
        )),
        Err(e) => Err(ExecutorError::InvalidArgument(format!(
            "Directory at the path {} cannot be accessed: {}",
            path.display(),
            e
        ))),
    }
}

fn missing_pipe(stream: &str) -> ExecutorError {
    ExecutorError::execution(
        format!("attaching to {}", stream),
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stream was not captured"),
    )
}

/// Feed every line of `stream` to `consumer` until end of stream.
///
/// A line ends at `\n`, `\r` or `\r\n`, the last one counting as a single
/// terminator even when the two bytes arrive in separate reads. The stream is
/// owned by this function and closed when it returns, on success and on error
/// alike.
async fn drain_lines<R>(stream: R, mut consumer: LineConsumer, name: &'static str) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut lines = 0usize;
    let mut skip_lf = false;

    loop {
        let available = reader
            .fill_buf()
            .await
            .map_err(|e| ExecutorError::execution(format!("reading {}", name), e))?;
        if available.is_empty() {
            break;
        }

        for &byte in available {
            if std::mem::take(&mut skip_lf) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' | b'\r' => {
                    consumer(decode_line(&line));
                    line.clear();
                    lines += 1;
                    skip_lf = byte == b'\r';
                }
                _ => line.push(byte),
            }
        }

        let consumed = available.len();
        reader.consume(consumed);
    }

    if !line.is_empty() {
        consumer(decode_line(&line));
        lines += 1;
    }

    debug!(stream = name, lines, "Output stream drained");
    Ok(lines)
}

async fn join_drain(handle: JoinHandle<Result<usize>>, name: &'static str) -> Result<usize> {
    handle.await.map_err(|e| {
        ExecutorError::execution(
            format!("draining {}", name),
            std::io::Error::other(e.to_string()),
        )
    })?
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

/// Values of the extra variables are left out; they often carry credentials.
fn describe_context(
    command: &[String],
    working_directory: &Path,
    extra_env_variables: &HashMap<String, String>,
) -> String {
    let mut env_names: Vec<&str> = extra_env_variables.keys().map(String::as_str).collect();
    env_names.sort_unstable();

    format!(
        "{{command: {:?}, working directory: {}, extra env variables: {:?}}}",
        command,
        working_directory.display(),
        env_names
    )
}
