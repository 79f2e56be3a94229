pub mod error;
pub mod sender;

pub use error::{CallbackError, Result};
pub use sender::{CallbackSender, HttpCallbackSender};
