mod common;

use netscout::{ScanError, ScanOptions, Scanner};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use common::{mock_any, mock_crtsh_query, test_config};

fn subdomains_only() -> ScanOptions {
    ScanOptions { dns: false, whois: false, subdomains: true }
}

#[tokio::test]
async fn test_scan_rejects_invalid_domain() {
    let server = MockServer::start().await;
    let scanner = Scanner::new(&test_config(&server, 1));

    for input in ["", "a..b.com", "not a domain", "localhost"] {
        let result = scanner.scan_domain(input, ScanOptions::default(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(ScanError::InvalidDomain(_))), "{:?} accepted", input);
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_normalizes_target_and_collects_subdomains() {
    let server = MockServer::start().await;
    mock_crtsh_query(&server, "%.example.com", json!([{"name_value": "*.dev.example.com"}])).await;
    mock_crtsh_query(&server, "example.com", json!([{"name_value": "www.example.com"}])).await;

    let scanner = Scanner::new(&test_config(&server, 1));
    let result = scanner
        .scan_domain("https://www.Example.com/login", subdomains_only(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.target_domain, "example.com");
    assert_eq!(result.subdomains, vec!["dev.example.com", "www.example.com"]);
    assert_eq!(result.summary.total_subdomains, 2);
    assert_eq!(result.summary.total_ip_addresses, 0);
    assert_eq!(result.dns_info.domain, "example.com");
    assert!(result.dns_info.is_empty());
    assert_eq!(result.whois_info.domain, "example.com");
}

#[tokio::test]
async fn test_scan_survives_aggregator_outage() {
    let server = mock_any(500, "internal error").await;

    let scanner = Scanner::new(&test_config(&server, 2));
    let result = scanner
        .scan_domain("example.com", subdomains_only(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.subdomains.is_empty());
    assert_eq!(result.summary.total_subdomains, 0);
}

#[tokio::test]
async fn test_scan_json_round_trip() {
    let server = MockServer::start().await;
    mock_crtsh_query(&server, "%.example.com", json!([{"name_value": "api.example.com"}])).await;
    mock_crtsh_query(&server, "example.com", json!([])).await;

    let scanner = Scanner::new(&test_config(&server, 1));
    let result = scanner
        .scan_domain("example.com", subdomains_only(), &CancellationToken::new())
        .await
        .unwrap();

    let text = netscout::output::to_json(&result).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["subdomains"], json!(["api.example.com"]));
    assert_eq!(v["summary"]["total_subdomains"], 1);
}
