pub mod context;
pub mod error;
pub mod process;
pub mod traits;

pub use context::{LineConsumer, ProcessContext, ProcessContextBuilder};
pub use error::{ExecutorError, Result};
pub use process::TokioProcessExecutor;
pub use traits::{ProcessExecutor, LINE_SEPARATOR};
