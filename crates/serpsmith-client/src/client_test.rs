use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use serpsmith_core::RateIntervals;

use super::*;

/// Pacing intervals of zero so client tests exercise HTTP behavior only.
fn unpaced() -> RateIntervals {
    RateIntervals {
        serp_ms: 0,
        generative_ms: 0,
        scrape_ms: 0,
        nlp_ms: 0,
    }
}

fn test_client(max_retries: u32) -> ApiClient {
    ApiClient::new(&unpaced(), 30, "serpsmith-test/0.1", max_retries, 0)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn get_json_parses_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = test_client(0);
    let cancel = CancellationToken::new();
    let body = client
        .get_json(EndpointClass::Serp, &format!("{}/data", server.uri()), &cancel)
        .await
        .expect("request should succeed");
    assert_eq!(body["ok"], serde_json::json!(true));
}

#[tokio::test]
async fn non_json_body_yields_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(3);
    let cancel = CancellationToken::new();
    let result = client
        .get_json(EndpointClass::Serp, &format!("{}/data", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(ApiError::Deserialize { .. })));
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(3);
    let cancel = CancellationToken::new();
    let result = client
        .get_json(EndpointClass::Serp, &format!("{}/data", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(ApiError::Upstream { status: 404, .. })));
}

#[tokio::test]
async fn rate_limited_response_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"after": 2})))
        .mount(&server)
        .await;

    let client = test_client(3);
    let cancel = CancellationToken::new();
    let body = client
        .get_json(EndpointClass::Serp, &format!("{}/data", server.uri()), &cancel)
        .await
        .expect("request should eventually succeed");
    assert_eq!(body["after"], serde_json::json!(2));
}

#[tokio::test]
async fn server_errors_are_retried_up_to_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // max_retries=2 → 3 total attempts
        .mount(&server)
        .await;

    let client = test_client(2);
    let cancel = CancellationToken::new();
    let result = client
        .get_json(EndpointClass::Serp, &format!("{}/data", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(ApiError::Upstream { status: 503, .. })));
}

#[tokio::test]
async fn post_json_sends_bearer_token() {
    use wiremock::matchers::header;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"seen": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(0);
    let cancel = CancellationToken::new();
    let body = client
        .post_json(
            EndpointClass::Nlp,
            &format!("{}/analyze", server.uri()),
            Some("secret-token"),
            &serde_json::json!({"text": "hello"}),
            &cancel,
        )
        .await
        .expect("request should succeed");
    assert_eq!(body["seen"], serde_json::json!(true));
}

#[tokio::test]
async fn slow_response_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&unpaced(), 1, "serpsmith-test/0.1", 0, 0)
        .expect("client construction should not fail");
    let cancel = CancellationToken::new();
    let result = client
        .get_text(EndpointClass::Scrape, &format!("{}/slow", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(ApiError::Timeout { .. })), "got: {result:?}");
}

#[tokio::test]
async fn pre_cancelled_token_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(3);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = client
        .get_text(EndpointClass::Scrape, &format!("{}/any", server.uri()), &cancel)
        .await;
    assert!(matches!(result, Err(ApiError::Cancelled)));
}
