//! End-to-end session flow: streaming analysis against a mock server,
//! summary projection, enrichment, export and persistence.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use depo_analyst::config::{GeminiConfig, RequestConfig};
use depo_analyst::gemini::GeminiClient;
use depo_analyst::model::Veracity;
use depo_analyst::session::SessionController;
use depo_analyst::storage::SqliteStorage;
use depo_analyst::tree;

fn client_for(base_url: &str) -> GeminiClient {
    let config = GeminiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        model: "gemini-2.5-flash".to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 0,
        retry_delay_ms: 100,
    };
    GeminiClient::new(&config, request_config).unwrap()
}

fn sse_event(text: &str) -> String {
    let event = json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    });
    format!("data: {}\n\n", event)
}

fn analysis_stream_body() -> String {
    let lines = [
        r#"{"id":"root","parentId":null,"title":"Testimony Summary","content":"Overview"}"#,
        r#"{"id":"profile","parentId":"root","title":"Deponent Profile","content":"Evasive but consistent."}"#,
        r#"{"id":"claims","parentId":"root","title":"Key Claims Made","content":"Claims"}"#,
        r#"{"id":"c1","parentId":"claims","title":"Claim 1","content":"X said Y","veracity":"UNCERTAIN"}"#,
        r#"{"id":"people","parentId":"root","title":"Key Individuals & Relationships","content":""}"#,
        r#"{"id":"p1","parentId":"people","title":"Jordan Hale","content":"Warehouse foreman"}"#,
        r#"{"id":"orphan","parentId":"ghost","title":"Orphan","content":""}"#,
    ];
    sse_event(&(lines.join("\n") + "\n"))
}

async fn analyzed_session(mock_server: &MockServer) -> SessionController<SqliteStorage> {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(analysis_stream_body()))
        .mount(mock_server)
        .await;

    let storage = SqliteStorage::new_in_memory().await.unwrap();
    let mut session = SessionController::new(client_for(&mock_server.uri()), storage);
    session.load_document("depo.txt", "the testimony", b"the testimony");
    session.analyze().await.unwrap();
    session
}

#[tokio::test]
async fn test_analyze_builds_tree_and_summary() {
    let mock_server = MockServer::start().await;
    let session = analyzed_session(&mock_server).await;

    let root = session.state.analysis.as_ref().unwrap();
    assert_eq!(root.id, "root");
    // 7 streamed records, 1 orphan dropped.
    assert_eq!(tree::count(root), 6);
    assert_eq!(
        root.source_file_hash.as_deref(),
        session.state.source_file_hash.as_deref()
    );

    let summary = session.state.summary.as_ref().unwrap();
    assert_eq!(summary.key_claims, 1);
    assert_eq!(summary.veracity_counts.get(Veracity::Uncertain), 1);
    assert_eq!(summary.deponent_profile, "Evasive but consistent.");
    assert_eq!(summary.key_individuals.len(), 1);
    assert_eq!(summary.key_individuals[0].name, "Jordan Hale");
}

#[tokio::test]
async fn test_explore_attaches_counter_argument() {
    let mock_server = MockServer::start().await;
    let mut session = analyzed_session(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Consider the opposite." }] } }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    session.explore("c1").await.unwrap();

    let root = session.state.analysis.as_ref().unwrap();
    let node = tree::find(root, "c1").unwrap();
    assert_eq!(node.alternative.as_deref(), Some("Consider the opposite."));
    assert!(!node.is_exploring);
}

#[tokio::test]
async fn test_fact_check_failure_lands_in_grounding_summary() {
    let mock_server = MockServer::start().await;
    let mut session = analyzed_session(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    session.fact_check("c1").await.unwrap();

    let root = session.state.analysis.as_ref().unwrap();
    let grounding = tree::find(root, "c1").unwrap().grounding.as_ref().unwrap();
    assert!(grounding.summary.starts_with("Fact check failed:"));
    assert!(grounding.sources.is_empty());
}

#[tokio::test]
async fn test_export_selected_subset_and_persist() {
    let mock_server = MockServer::start().await;
    let mut session = analyzed_session(&mock_server).await;

    session.select("claims", true).unwrap();
    session.select("c1", true).unwrap();
    let html = session.export_html().unwrap();
    assert!(html.contains("Claim 1"));
    assert!(!html.contains("Jordan Hale"));

    session.save().await.unwrap();
}
