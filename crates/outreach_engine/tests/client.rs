use std::time::Duration;

use outreach_engine::{ClientError, ReqwestWebhookClient, WebhookClient, WebhookSettings};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> ReqwestWebhookClient {
    ReqwestWebhookClient::new(&WebhookSettings::default()).expect("client")
}

#[tokio::test]
async fn posts_json_and_parses_mislabeled_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/Sheet_management"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"action": "update task", "id": "a1"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"status":"ok"}"#, "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/webhook/Sheet_management", server.uri());
    let body = client()
        .post_json(&url, &json!({"action": "update task", "id": "a1"}))
        .await
        .expect("post ok");
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn invalid_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("Workflow was started", "text/html"))
        .mount(&server)
        .await;

    let err = client()
        .post_json(&server.uri(), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(ref message) if message.contains("Workflow was started")));
    assert!(!err.is_network());
}

#[tokio::test]
async fn non_utf8_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"[{\"id\":\"a1\",\"name\":\"Caf\xE9\"}]".to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let err = client()
        .post_json(&server.uri(), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_body_reads_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let body = client().post_json(&server.uri(), &json!({})).await.expect("post ok");
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("sheet unavailable"))
        .mount(&server)
        .await;

    let err = client().post_json(&server.uri(), &json!({})).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::HttpStatus {
            status: 500,
            body: "sheet unavailable".to_string(),
        }
    );
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let settings = WebhookSettings {
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_millis(200),
    };
    let client = ReqwestWebhookClient::new(&settings).expect("client");
    let err = client.post_json(&server.uri(), &json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
    assert!(err.is_network());
}

#[tokio::test]
async fn unparseable_url_is_rejected_before_sending() {
    let err = client().post_json("not a url", &json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidUrl { ref url, .. } if url == "not a url"));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let err = client()
        .post_json("http://127.0.0.1:1/webhook", &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}
