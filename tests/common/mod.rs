#![allow(dead_code)]

use std::time::Duration;
use netscout::ScanConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointed at `server` with millisecond backoff so retry tests stay fast.
pub fn test_config(server: &MockServer, retries: u32) -> ScanConfig {
    ScanConfig::default()
        .ct_base_url(&server.uri())
        .retries(retries)
        .backoff(Duration::from_millis(10), Duration::from_millis(40))
}

/// Mounts a crt.sh-style JSON response for one `q` value.
pub async fn mock_crtsh_query(server: &MockServer, q: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", q))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Creates a mock server that answers every GET with `status` and `body`.
pub async fn mock_any(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    server
}
