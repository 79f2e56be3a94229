use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::context::{ProcessContext, ProcessContextBuilder};
use crate::error::Result;

/// Terminator appended to every captured line by [`ProcessExecutor::stdout`].
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Runs external programs and streams their output to line consumers.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run the process described by `context` and return its exit code.
    ///
    /// Both output streams are fully drained before this returns, so every
    /// consumer has seen every line by the time the caller gets the code.
    async fn execute(&self, context: ProcessContext) -> Result<i32>;

    /// Run the process and return everything it wrote to stdout, one
    /// [`LINE_SEPARATOR`] after each line. Any stdout consumer already set on
    /// `builder` is replaced; the stderr consumer is kept. The exit code is
    /// not reported.
    async fn stdout(&self, builder: ProcessContextBuilder) -> Result<String> {
        let buffer = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&buffer);

        let context = builder
            .stdout_consumer(move |line| {
                let mut buf = sink.lock().unwrap_or_else(PoisonError::into_inner);
                buf.push_str(&line);
                buf.push_str(LINE_SEPARATOR);
            })
            .build()?;

        self.execute(context).await?;

        let captured = std::mem::take(&mut *buffer.lock().unwrap_or_else(PoisonError::into_inner));
        Ok(captured)
    }
}
