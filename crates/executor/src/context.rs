use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ExecutorError, Result};

/// Callback invoked once per output line, in the order the lines were written.
pub type LineConsumer = Box<dyn FnMut(String) + Send + 'static>;

/// Immutable description of a single process invocation.
///
/// Built through [`ProcessContext::builder`]; the line consumers are handed
/// over to the executor, which is why a context is consumed by execution.
pub struct ProcessContext {
    command: Vec<String>,
    working_directory: PathBuf,
    extra_env_variables: HashMap<String, String>,
    stdout_consumer: LineConsumer,
    stderr_consumer: LineConsumer,
}

pub(crate) struct ProcessParts {
    pub command: Vec<String>,
    pub working_directory: PathBuf,
    pub extra_env_variables: HashMap<String, String>,
    pub stdout_consumer: LineConsumer,
    pub stderr_consumer: LineConsumer,
}

impl ProcessContext {
    pub fn builder() -> ProcessContextBuilder {
        ProcessContextBuilder::default()
    }

    /// Executable followed by its arguments. Never empty.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn extra_env_variables(&self) -> &HashMap<String, String> {
        &self.extra_env_variables
    }

    pub(crate) fn into_parts(self) -> ProcessParts {
        ProcessParts {
            command: self.command,
            working_directory: self.working_directory,
            extra_env_variables: self.extra_env_variables,
            stdout_consumer: self.stdout_consumer,
            stderr_consumer: self.stderr_consumer,
        }
    }
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("command", &self.command)
            .field("working_directory", &self.working_directory)
            .field("extra_env_variables", &self.extra_env_variables)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ProcessContextBuilder {
    command: Vec<String>,
    working_directory: Option<PathBuf>,
    extra_env_variables: HashMap<String, String>,
    stdout_consumer: Option<LineConsumer>,
    stderr_consumer: Option<LineConsumer>,
}

impl ProcessContextBuilder {
    /// Replace the whole command line.
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.push(arg.into());
        self
    }

    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add one variable on top of the inherited environment. Later values win.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env_variables.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra_env_variables
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn stdout_consumer(mut self, consumer: impl FnMut(String) + Send + 'static) -> Self {
        self.stdout_consumer = Some(Box::new(consumer));
        self
    }

    pub fn stderr_consumer(mut self, consumer: impl FnMut(String) + Send + 'static) -> Self {
        self.stderr_consumer = Some(Box::new(consumer));
        self
    }

    /// Finish the context. Lines of a stream without a consumer are discarded.
    pub fn build(self) -> Result<ProcessContext> {
        if self.command.is_empty() {
            return Err(ExecutorError::InvalidArgument(
                "command must not be empty".to_string(),
            ));
        }
        if self.command[0].is_empty() {
            return Err(ExecutorError::InvalidArgument(
                "executable name must not be empty".to_string(),
            ));
        }
        let working_directory = self.working_directory.ok_or_else(|| {
            ExecutorError::InvalidArgument("working directory must be set".to_string())
        })?;

        Ok(ProcessContext {
            command: self.command,
            working_directory,
            extra_env_variables: self.extra_env_variables,
            stdout_consumer: self.stdout_consumer.unwrap_or_else(|| Box::new(|_| {})),
            stderr_consumer: self.stderr_consumer.unwrap_or_else(|| Box::new(|_| {})),
        })
    }
}

impl fmt::Debug for ProcessContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContextBuilder")
            .field("command", &self.command)
            .field("working_directory", &self.working_directory)
            .field("extra_env_variables", &self.extra_env_variables)
            .finish_non_exhaustive()
    }
}
