use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Final outcome of an operation reported back to the orchestrating system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Success,
    Failed,
    TimedOut,
    Cancelled,
    SystemError,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "TIMED_OUT" => Some(Self::TimedOut),
            "CANCELLED" => Some(Self::Cancelled),
            "SYSTEM_ERROR" => Some(Self::SystemError),
            _ => None,
        }
    }

    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Anything that can be delivered as a callback body.
///
/// Implementors check their own schema in [`CallbackPayload::validate`]; a
/// sender must call it before any network I/O.
pub trait CallbackPayload: Serialize + Send + Sync {
    fn validate(&self) -> Result<()>;

    /// Identifier the receiver uses to correlate the callback with its request.
    fn correlation_id(&self) -> &str;
}

/// Generic callback carrying the correlation id and the result status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReqourCallback {
    pub id: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReqourCallback {
    pub fn new(id: impl Into<String>, status: ResultStatus) -> Self {
        Self {
            id: id.into(),
            status,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl CallbackPayload for ReqourCallback {
    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation(
                "callback id must not be blank".to_string(),
            ));
        }
        if self.status.is_success() && self.error.is_some() {
            return Err(CoreError::Validation(format!(
                "callback {} has status {} but carries an error",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn correlation_id(&self) -> &str {
        &self.id
    }
}

/// Result of cloning an external repository into an internal one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCloneResponseCallback {
    pub origin_repo_url: String,
    pub target_repo_url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub callback: ReqourCallback,
}

impl CallbackPayload for RepositoryCloneResponseCallback {
    fn validate(&self) -> Result<()> {
        if self.origin_repo_url.trim().is_empty() {
            return Err(CoreError::Validation(
                "originRepoUrl must not be blank".to_string(),
            ));
        }
        if self.target_repo_url.trim().is_empty() {
            return Err(CoreError::Validation(
                "targetRepoUrl must not be blank".to_string(),
            ));
        }
        self.callback.validate()
    }

    fn correlation_id(&self) -> &str {
        &self.callback.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_status_serialization() {
        let json = serde_json::to_string(&ResultStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");

        let json = serde_json::to_string(&ResultStatus::SystemError).unwrap();
        assert_eq!(json, "\"SYSTEM_ERROR\"");
    }

    #[test]
    fn test_result_status_parse_matches_as_str() {
        for status in [
            ResultStatus::Success,
            ResultStatus::Failed,
            ResultStatus::TimedOut,
            ResultStatus::Cancelled,
            ResultStatus::SystemError,
        ] {
            assert_eq!(ResultStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ResultStatus::parse("success"), None);
    }

    #[test]
    fn test_result_status_from_exit_code() {
        assert_eq!(ResultStatus::from_exit_code(0), ResultStatus::Success);
        assert_eq!(ResultStatus::from_exit_code(1), ResultStatus::Failed);
        assert_eq!(ResultStatus::from_exit_code(-1), ResultStatus::Failed);
    }

    #[test]
    fn test_reqour_callback_json_shape() {
        let callback = ReqourCallback::new("abc", ResultStatus::Success);
        let value = serde_json::to_value(&callback).unwrap();
        assert_eq!(value, json!({"id": "abc", "status": "SUCCESS"}));

        let failed = ReqourCallback::new("abc", ResultStatus::Failed).with_error("boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["error"], "boom");
    }

    #[test]
    fn test_reqour_callback_validation() {
        assert!(ReqourCallback::new("abc", ResultStatus::Success)
            .validate()
            .is_ok());
        assert!(ReqourCallback::new("  ", ResultStatus::Success)
            .validate()
            .is_err());
        assert!(ReqourCallback::new("abc", ResultStatus::Success)
            .with_error("should not be here")
            .validate()
            .is_err());
        assert!(ReqourCallback::new("abc", ResultStatus::SystemError)
            .with_error("disk full")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_repository_clone_callback_json_shape() {
        let callback = RepositoryCloneResponseCallback {
            origin_repo_url: "https://github.com/org/repo.git".to_string(),
            target_repo_url: "git@internal:org/repo.git".to_string(),
            reference: Some("main".to_string()),
            callback: ReqourCallback::new("task-1", ResultStatus::Success),
        };

        let value = serde_json::to_value(&callback).unwrap();
        assert_eq!(value["originRepoUrl"], "https://github.com/org/repo.git");
        assert_eq!(value["targetRepoUrl"], "git@internal:org/repo.git");
        assert_eq!(value["ref"], "main");
        assert_eq!(value["callback"]["id"], "task-1");
        assert_eq!(callback.correlation_id(), "task-1");
    }

    #[test]
    fn test_repository_clone_callback_validation() {
        let mut callback = RepositoryCloneResponseCallback {
            origin_repo_url: "https://github.com/org/repo.git".to_string(),
            target_repo_url: String::new(),
            reference: None,
            callback: ReqourCallback::new("task-1", ResultStatus::Failed),
        };
        let err = callback.validate().unwrap_err();
        assert!(err.to_string().contains("targetRepoUrl"));

        callback.target_repo_url = "git@internal:org/repo.git".to_string();
        assert!(callback.validate().is_ok());

        callback.callback.id = String::new();
        assert!(callback.validate().is_err());
    }
}
