use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The request was rejected before any process was started.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The process could not be started, waited for, or drained.
    #[error("Execution failed while {context}: {source}")]
    ExecutionFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutorError {
    pub(crate) fn execution(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::ExecutionFailure {
            context: context.into(),
            source,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::ExecutionFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
