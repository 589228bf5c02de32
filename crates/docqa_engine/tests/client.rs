use std::sync::Arc;
use std::time::Duration;

use docqa_engine::{
    Answer, ClientSettings, Document, FailureKind, PageValue, RagBackend, ReqwestBackend,
    UploadReceipt,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(ClientSettings {
        origin: server.uri(),
        ..ClientSettings::default()
    })
    .expect("backend")
}

fn report_pdf() -> Document {
    Document {
        filename: "report.pdf".to_string(),
        mime_type: Some("application/pdf".to_string()),
        bytes: Arc::from(&b"%PDF-1.4 body"[..]),
    }
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"report.pdf\""))
        .and(body_string_contains("application/pdf"))
        .and(body_string_contains("%PDF-1.4 body"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "filename": "report.pdf",
            "message": "3 chunks indexed",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = backend_for(&server)
        .upload(&report_pdf())
        .await
        .expect("upload ok");

    assert_eq!(
        receipt,
        UploadReceipt {
            filename: "report.pdf".to_string(),
            message: "3 chunks indexed".to_string(),
        }
    );
}

#[tokio::test]
async fn upload_failure_uses_detail_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"detail": "file too large"})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&report_pdf())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(413));
    assert_eq!(err.detail(), "file too large");
}

#[tokio::test]
async fn failure_without_detail_falls_back_to_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&report_pdf())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.detail(), "Request failed with status code 500");
}

#[tokio::test]
async fn malformed_upload_receipt_is_its_own_error_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&report_pdf())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::MalformedResponse);
    assert!(err.detail().starts_with("malformed response:"));
}

#[tokio::test]
async fn query_posts_json_and_parses_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"query": "What is covered?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Dental and vision.",
            "sources": ["policy.pdf"],
            "pages": [2, 3],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend_for(&server)
        .query("What is covered?")
        .await
        .expect("query ok");

    assert_eq!(
        answer,
        Answer {
            answer: "Dental and vision.".to_string(),
            sources: vec!["policy.pdf".to_string()],
            pages: vec![PageValue::Integer(2), PageValue::Integer(3)],
        }
    );
}

#[tokio::test]
async fn query_tolerates_missing_or_null_lists_and_mixed_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"query": "bare"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok", "sources": null})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"query": "mixed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "ok",
            "sources": ["a.pdf"],
            "pages": [1, "iv", 2.5],
        })))
        .mount(&server)
        .await;
    let backend = backend_for(&server);

    let bare = backend.query("bare").await.expect("bare ok");
    assert!(bare.sources.is_empty());
    assert!(bare.pages.is_empty());

    let mixed = backend.query("mixed").await.expect("mixed ok");
    let rendered: Vec<String> = mixed.pages.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["1", "iv", "2.5"]);
}

#[tokio::test]
async fn query_without_answer_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sources": []})))
        .mount(&server)
        .await;

    let err = backend_for(&server).query("q").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn query_failure_uses_detail_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "index not found"})))
        .mount(&server)
        .await;

    let err = backend_for(&server).query("q").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.to_string(), "index not found");
}

#[tokio::test]
async fn delete_document_posts_filename() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete_document/"))
        .and(body_json(json!({"filename": "report.pdf"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Successfully deleted 'report.pdf' and its chunks.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = backend_for(&server)
        .delete_document("report.pdf")
        .await
        .expect("delete ok");

    assert_eq!(message, "Successfully deleted 'report.pdf' and its chunks.");
}

#[tokio::test]
async fn delete_document_failure_uses_detail_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete_document/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Error deleting document 'gone.pdf': not indexed",
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .delete_document("gone.pdf")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.detail(), "Error deleting document 'gone.pdf': not indexed");
}

#[tokio::test]
async fn health_reports_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "RAG API is running"})))
        .mount(&server)
        .await;

    let status = backend_for(&server).health().await.expect("health ok");

    assert_eq!(status, "RAG API is running");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    // Nothing listens on a port we just released.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let origin = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let backend = ReqwestBackend::new(ClientSettings {
        origin,
        ..ClientSettings::default()
    })
    .expect("backend");
    let err = backend.query("q").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Network);
    assert!(!err.detail().is_empty());
}

#[tokio::test]
async fn slow_backend_times_out_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"answer": "late"})),
        )
        .mount(&server)
        .await;

    let backend = ReqwestBackend::new(ClientSettings {
        origin: server.uri(),
        request_timeout: Some(Duration::from_millis(50)),
        ..ClientSettings::default()
    })
    .expect("backend");
    let err = backend.query("q").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_origin_is_rejected_up_front() {
    let err = ReqwestBackend::new(ClientSettings {
        origin: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidOrigin);
}
