// Unit tests for Apihub

use apihub::core::{
    health::{batches, classify, ProbeResult, ProbeStatus, StatusReport},
    page::extract_metadata,
    registry::{self, Category, HttpMethod},
};
use apihub::ApiResponse;
use reqwest::Url;
use serde_json::json;

fn probe(path: &str, status: ProbeStatus) -> ProbeResult {
    ProbeResult {
        path: path.to_string(),
        method: HttpMethod::Get,
        category: Category::Tools,
        status,
        http_status: None,
        response_time_ms: 3,
        error: None,
    }
}

#[test]
fn test_report_serialization_shape() {
    let report = StatusReport::new(
        "https://api.example.com",
        5,
        vec![probe("/tools/metadata", ProbeStatus::Online), probe("/tools/shortlink", ProbeStatus::Timeout)],
    );
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["base_url"], "https://api.example.com");
    assert_eq!(value["online"], 1);
    assert_eq!(value["timeout"], 1);
    assert_eq!(value["endpoints"][1]["status"], "timeout");
    assert_eq!(value["endpoints"][1]["method"], "GET");
    assert_eq!(value["endpoints"][1]["category"], "tools");
    // Absent optionals are left out entirely
    assert!(value["endpoints"][0].get("http_status").is_none());
    assert!(value["endpoints"][0].get("error").is_none());
}

#[test]
fn test_classify_redirect_is_offline() {
    let (status, error) = classify(302, b"");
    assert_eq!(status, ProbeStatus::Offline);
    assert_eq!(error.as_deref(), Some("HTTP 302"));
}

#[test]
fn test_classify_error_envelope_message_wins() {
    let body = serde_json::to_vec(&ApiResponse::error("me", "upstream timed out")).unwrap();
    let (status, error) = classify(504, &body);
    assert_eq!(status, ProbeStatus::Offline);
    assert_eq!(error.as_deref(), Some("upstream timed out"));
}

#[test]
fn test_probe_targets_follow_batching() {
    let targets = registry::probe_targets();
    let batched: Vec<_> = batches(&targets, 3).flat_map(|b| b.iter().cloned()).collect();
    assert_eq!(batched, targets);
    assert_eq!(batches(&targets, 3).count(), targets.len().div_ceil(3));
}

#[test]
fn test_probe_targets_carry_sample_queries() {
    let wiki = registry::probe_targets()
        .into_iter()
        .find(|t| t.path == "/search/wikipedia")
        .unwrap();
    assert_eq!(wiki.category, Category::Search);
    assert_eq!(wiki.query, vec![("q".to_string(), "Rust (programming language)".to_string())]);
}

#[test]
fn test_catalog_serialization_hides_probe_samples() {
    let value = serde_json::to_value(registry::by_category()).unwrap();
    let tools = value["tools"].as_array().unwrap();
    let metadata = tools.iter().find(|e| e["path"] == "/tools/metadata").unwrap();

    assert_eq!(metadata["method"], "GET");
    assert_eq!(metadata["params"], json!([{"name": "url", "required": true, "description": "http(s) URL of the page"}]));
    assert!(metadata.get("probe").is_none());
}

#[test]
fn test_metadata_from_realistic_page() {
    let html = r#"
        <html>
          <head>
            <meta charset="utf-8">
            <title>Crates.io: Rust Package Registry</title>
            <meta property="og:title" content="crates.io">
            <meta property="og:description" content="The Rust community's crate registry">
            <meta property="og:url" content="https://crates.io/">
            <link rel="icon" type="image/png" href="assets/cargo.png">
          </head>
          <body><nav><a href="/crates">Browse</a></nav></body>
        </html>
    "#;
    let url = Url::parse("https://crates.io/").unwrap();
    let meta = extract_metadata(html, &url);

    assert_eq!(meta.title.as_deref(), Some("Crates.io: Rust Package Registry"));
    // No plain description tag, so Open Graph fills in
    assert_eq!(meta.description.as_deref(), Some("The Rust community's crate registry"));
    assert_eq!(meta.open_graph.get("url").map(String::as_str), Some("https://crates.io/"));
    assert_eq!(meta.icons, vec!["https://crates.io/assets/cargo.png".to_string()]);
    assert_eq!(meta.links.internal, 1);
    assert!(meta.headings.is_empty());
}

#[test]
fn test_envelope_data_variant() {
    let value = serde_json::to_value(ApiResponse::data("me", json!({"total": 1}))).unwrap();
    assert_eq!(value, json!({"status": true, "creator": "me", "data": {"total": 1}}));
}
