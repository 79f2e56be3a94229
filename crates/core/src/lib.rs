pub mod domain;
pub mod error;

pub use domain::callback::{
    CallbackPayload, ReqourCallback, RepositoryCloneResponseCallback, ResultStatus,
};
pub use error::{CoreError, Result};
