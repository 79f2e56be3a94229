use std::time::Duration;

use callback::{CallbackSender, HttpCallbackSender};
use reqour_core::{ReqourCallback, RepositoryCloneResponseCallback, ResultStatus};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sender() -> HttpCallbackSender {
    HttpCallbackSender::with_timeout(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_post_callback_is_delivered_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"id": "abc", "status": "SUCCESS"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let status = sender()
        .send(
            "POST",
            &format!("{}/callback", server.uri()),
            ReqourCallback::new("abc", ResultStatus::Success),
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_body_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/operations/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sent = ReqourCallback::new("op-42", ResultStatus::SystemError).with_error("disk full");
    let status = sender()
        .send("put", &format!("{}/operations/42", server.uri()), sent.clone())
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let received: ReqourCallback = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(received, sent);
}

#[tokio::test]
async fn test_repository_clone_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .and(body_json(json!({
            "originRepoUrl": "https://github.com/org/repo.git",
            "targetRepoUrl": "git@internal:org/repo.git",
            "ref": "main",
            "callback": {"id": "task-7", "status": "SUCCESS"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let callback = RepositoryCloneResponseCallback {
        origin_repo_url: "https://github.com/org/repo.git".to_string(),
        target_repo_url: "git@internal:org/repo.git".to_string(),
        reference: Some("main".to_string()),
        callback: ReqourCallback::new("task-7", ResultStatus::Success),
    };

    let status = sender()
        .send_repository_clone_callback("POST", &format!("{}/clone", server.uri()), callback)
        .await
        .unwrap();
    assert!(status.is_success());
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let status = sender()
        .send(
            "POST",
            &format!("{}/callback", server.uri()),
            ReqourCallback::new("abc", ResultStatus::Failed),
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_invalid_payload_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = sender()
        .send(
            "POST",
            &format!("{}/callback", server.uri()),
            ReqourCallback::new("", ResultStatus::Success),
        )
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_method_or_url_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = sender()
        .send(
            "NOT A METHOD",
            &server.uri(),
            ReqourCallback::new("abc", ResultStatus::Success),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = sender()
        .send(
            "POST",
            "not a url",
            ReqourCallback::new("abc", ResultStatus::Success),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let ftp_url = server.uri().replacen("http://", "ftp://", 1);
    let err = sender()
        .send(
            "POST",
            &ftp_url,
            ReqourCallback::new("abc", ResultStatus::Success),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!err.is_delivery());
}

#[tokio::test]
async fn test_unreachable_host_is_delivery_failure() {
    // Nothing listens on port 1.
    let err = sender()
        .send(
            "POST",
            "http://127.0.0.1:1/callback",
            ReqourCallback::new("abc", ResultStatus::Success),
        )
        .await
        .unwrap_err();

    assert!(err.is_delivery());
    assert!(err.to_string().contains("http://127.0.0.1:1/callback"));
}
