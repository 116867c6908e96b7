//! End-to-end composition against a fake essay service.

use std::sync::Arc;

use essay_composer::client::{EssayClient, GenerationService};
use essay_composer::compose::{Clipboard, ComposeError, EssaySession, SectionState};
use essay_composer::render::render_outline;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, Arc<dyn GenerationService>) {
    let server = MockServer::start().await;
    let client = EssayClient::new(server.uri(), Some("tok".to_string()));
    (server, Arc::new(client))
}

async fn mount_outline(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/files/generate-outline"))
        .and(query_param("document_id", "doc-1"))
        .and(query_param("topic", "AI in medicine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "e-1",
            "document_id": "doc-1",
            "title": "AI in medicine",
            "outline": {
                "outline": [
                    { "header": "Intro", "description": "Set the scene" },
                    { "header": "Evidence", "description": "Summarize the trials" }
                ]
            },
            "content": {}
        }])))
        .mount(server)
        .await;
}

async fn mount_section(server: &MockServer, header: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/files/e-1/generate-section"))
        .and(query_param("header", header))
        .and(query_param("document_id", "doc-1"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[derive(Default)]
struct RecordingClipboard {
    text: Option<String>,
}

impl Clipboard for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ComposeError> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn outline_then_one_section() {
    let (server, service) = setup().await;
    mount_outline(&server).await;
    mount_section(&server, "Evidence", 200, json!("Evidence text")).await;

    let session = EssaySession::create(service, "doc-1", "AI in medicine")
        .await
        .expect("create");
    let headers: Vec<_> = session.outline().iter().map(|e| e.header.as_str()).collect();
    assert_eq!(headers, vec!["Intro", "Evidence"]);
    assert_eq!(session.progress().ratio(), 0.0);

    let text = assert_ok!(session.generate_section("Evidence").await);
    assert_eq!(text, "Evidence text");

    assert_eq!(session.progress().ratio(), 0.5);
    assert_eq!(session.state("Evidence"), SectionState::Completed);
    assert_eq!(session.state("Intro"), SectionState::Idle);
    assert_eq!(
        session.assemble(),
        "## Intro\n\n\n\n## Evidence\n\nEvidence text"
    );

    let artifact = session.download();
    assert_eq!(artifact.file_name, "AI in medicine.md");
    assert_eq!(artifact.bytes, session.assemble().into_bytes());
}

#[tokio::test]
async fn generate_missing_isolates_failures() {
    let (server, service) = setup().await;
    mount_outline(&server).await;
    mount_section(&server, "Intro", 200, json!({ "content": "Intro text" })).await;
    mount_section(
        &server,
        "Evidence",
        404,
        json!({ "detail": "No relevant info found in PDF" }),
    )
    .await;

    let session = EssaySession::create(service, "doc-1", "AI in medicine")
        .await
        .expect("create");
    let results = session.generate_missing().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "Intro");
    assert!(results[0].1.is_ok());
    assert_eq!(results[1].0, "Evidence");
    assert!(results[1].1.is_err());

    assert_eq!(session.section_text("Intro").as_deref(), Some("Intro text"));
    assert!(session.section_text("Evidence").is_none());
    assert_eq!(session.state("Evidence"), SectionState::Idle);
    assert_eq!(session.missing_headers(), vec!["Evidence".to_string()]);

    let rendered = render_outline(&session);
    assert!(rendered.contains("1/2 sections (50%)"));
    assert!(rendered.contains("1. ● Intro"));
    assert!(rendered.contains("2. ✗ Evidence"));
    assert!(rendered.contains("No relevant info found in PDF"));
}

#[tokio::test]
async fn unknown_header_is_rejected_without_a_request() {
    let (server, service) = setup().await;
    mount_outline(&server).await;
    Mock::given(method("POST"))
        .and(path("/files/e-1/generate-section"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("never")))
        .expect(0)
        .mount(&server)
        .await;

    let session = EssaySession::create(service, "doc-1", "AI in medicine")
        .await
        .expect("create");
    let err = session.generate_section("Conclusion").await.unwrap_err();

    assert!(matches!(err, ComposeError::UnknownHeader(h) if h == "Conclusion"));
}

#[tokio::test]
async fn empty_topic_is_rejected_before_any_request() {
    let (_server, service) = setup().await;
    let err = EssaySession::create(service, "doc-1", "   ").await.err();
    assert!(matches!(err, Some(ComposeError::EmptyTopic)));
}

#[tokio::test]
async fn reopened_essay_keeps_saved_sections_and_reconciles() {
    let (server, service) = setup().await;
    Mock::given(method("GET"))
        .and(path("/files/e-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e-1",
            "doc_id": "doc-1",
            "topic": "Climate Policy",
            "outline": "[{\"header\":\"Intro\",\"description\":\"\"},{\"header\":\"Body\",\"description\":\"\"}]",
            "content": { "Intro": "saved intro" }
        })))
        .mount(&server)
        .await;
    mount_section(&server, "Body", 200, json!({ "text": "fresh body" })).await;

    let mut session = EssaySession::open(service, "e-1").await.expect("open");
    assert_eq!(session.progress().ratio(), 0.5);

    session.generate_section("Body").await.expect("section");
    session.reconcile().await.expect("reconcile");

    assert_eq!(session.section_text("Intro").as_deref(), Some("saved intro"));
    assert_eq!(session.section_text("Body").as_deref(), Some("fresh body"));
    assert!(session.progress().is_complete());

    let mut clipboard = RecordingClipboard::default();
    session.copy(&mut clipboard).expect("copy");
    assert_eq!(
        clipboard.text.as_deref(),
        Some("## Intro\n\nsaved intro\n\n## Body\n\nfresh body")
    );
    assert_eq!(session.download().file_name, "Climate Policy.md");
}

#[tokio::test]
async fn unparseable_outline_means_no_outline_yet() {
    let (server, service) = setup().await;
    Mock::given(method("GET"))
        .and(path("/files/e-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e-2",
            "doc_id": "doc-1",
            "outline": "not json"
        })))
        .mount(&server)
        .await;

    let session = EssaySession::open(service, "e-2").await.expect("open");

    assert!(!session.has_outline());
    assert_eq!(session.progress().ratio(), 0.0);
    assert_eq!(session.assemble(), "");
    let artifact = session.download();
    assert_eq!(artifact.file_name, "essay.md");
    assert!(artifact.bytes.is_empty());

    let mut clipboard = RecordingClipboard::default();
    assert_ok!(session.copy(&mut clipboard));
    assert_eq!(clipboard.text.as_deref(), Some(""));
}

#[tokio::test]
async fn dropped_session_discards_spawned_section() {
    let (server, service) = setup().await;
    mount_outline(&server).await;
    Mock::given(method("POST"))
        .and(path("/files/e-1/generate-section"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("late"))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let session = EssaySession::create(service, "doc-1", "AI in medicine")
        .await
        .expect("create");
    let handle = session.spawn_section("Intro").expect("spawn");
    assert_eq!(session.state("Intro"), SectionState::Generating);
    drop(session);

    let result = handle.await.expect("join");
    assert!(matches!(result, Err(ComposeError::Detached { .. })));
}
