use std::time::Duration;

use async_trait::async_trait;
use reqour_core::{CallbackPayload, RepositoryCloneResponseCallback};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode, Url};
use tracing::{info, warn};

use crate::error::{CallbackError, Result};

/// Sending the callback to the location provided by the notifier of the operation.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    /// Send `payload` to `url` using `method`.
    ///
    /// The payload is validated first; an invalid payload sends nothing.
    /// Exactly one request is issued otherwise, and whatever status the
    /// receiver answered with is handed back to the caller.
    async fn send<P>(&self, method: &str, url: &str, payload: P) -> Result<StatusCode>
    where
        P: CallbackPayload + 'async_trait;

    async fn send_repository_clone_callback(
        &self,
        method: &str,
        url: &str,
        callback: RepositoryCloneResponseCallback,
    ) -> Result<StatusCode> {
        self.send(method, url, callback).await
    }
}

/// [`CallbackSender`] delivering JSON bodies over HTTP with `reqwest`.
///
/// No retries: a transport failure is returned as
/// [`CallbackError::Delivery`] and the caller decides what to do with it.
#[derive(Debug, Clone)]
pub struct HttpCallbackSender {
    client: Client,
}

impl HttpCallbackSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CallbackError::Client)?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send<P>(&self, method: &str, url: &str, payload: P) -> Result<StatusCode>
    where
        P: CallbackPayload + 'async_trait,
    {
        payload.validate()?;
        let method = parse_method(method)?;
        let target = parse_url(url)?;
        let body = serde_json::to_vec(&payload)?;

        info!(
            method = method.as_str(),
            url,
            id = payload.correlation_id(),
            "Sending callback"
        );

        let response = self
            .client
            .request(method, target)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| CallbackError::Delivery {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            info!(url, %status, id = payload.correlation_id(), "Callback delivered");
        } else {
            warn!(
                url,
                %status,
                id = payload.correlation_id(),
                "Callback receiver answered with a non-success status"
            );
        }

        Ok(status)
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let normalized = method.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(CallbackError::Validation(
            "callback method must not be blank".to_string(),
        ));
    }
    Method::from_bytes(normalized.as_bytes())
        .map_err(|_| CallbackError::Validation(format!("invalid callback method: {}", method)))
}

fn parse_url(url: &str) -> Result<Url> {
    let target = Url::parse(url)
        .map_err(|e| CallbackError::Validation(format!("invalid callback URL {}: {}", url, e)))?;
    match target.scheme() {
        "http" | "https" => Ok(target),
        scheme => Err(CallbackError::Validation(format!(
            "unsupported callback URL scheme {} in {}",
            scheme, url
        ))),
    }
}
