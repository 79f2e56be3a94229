//! Glue between the process executor and the callback sender.

use anyhow::Result;
use callback::CallbackSender;
use executor::{ProcessContext, ProcessExecutor};
use reqour_core::{ReqourCallback, ResultStatus};
use tracing::{error, info};

/// Where and how to report the outcome of a command.
#[derive(Debug, Clone)]
pub struct CallbackTarget {
    pub method: String,
    pub url: String,
    pub id: String,
}

/// Run `context`, then report the outcome to `target` if one is given.
///
/// An execution error is still reported (as `SYSTEM_ERROR`) before being
/// returned. The exit code is returned once the callback, if any, went out.
/// When both the execution and the callback fail, the execution error is the
/// one returned, with the delivery failure attached as context.
pub async fn run_and_report<E, S>(
    executor: &E,
    sender: &S,
    context: ProcessContext,
    target: Option<&CallbackTarget>,
) -> Result<i32>
where
    E: ProcessExecutor,
    S: CallbackSender,
{
    let outcome = executor.execute(context).await;

    let Some(target) = target else {
        return Ok(outcome?);
    };

    let payload = match &outcome {
        Ok(code) => {
            let status = ResultStatus::from_exit_code(*code);
            let payload = ReqourCallback::new(target.id.clone(), status);
            if status.is_success() {
                payload
            } else {
                payload.with_error(format!("Command exited with code {}", code))
            }
        }
        Err(e) => {
            error!(id = %target.id, error = %e, "Command could not be executed");
            ReqourCallback::new(target.id.clone(), ResultStatus::SystemError)
                .with_error(e.to_string())
        }
    };

    let sent = sender.send(&target.method, &target.url, payload).await;
    match (outcome, sent) {
        (Err(execution), Err(delivery)) => Err(anyhow::Error::new(execution).context(format!(
            "Reporting the failure to {} also failed: {}",
            target.url, delivery
        ))),
        (_, Err(delivery)) => Err(delivery.into()),
        (outcome, Ok(status)) => {
            info!(id = %target.id, %status, "Outcome reported");
            Ok(outcome?)
        }
    }
}
