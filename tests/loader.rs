//! Integration tests for document loading: local paths, `file://` URLs,
//! HTTP with content sniffing, and size limits.

mod common;

use common::{minimal_docx, minimal_pdf, spawn_mock, MockState};
use docqa::config::LoaderConfig;
use docqa::extract::{MIME_DOCX, MIME_PDF};
use docqa::loader::HttpLoader;
use docqa_core::DocumentLoader;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn loader() -> HttpLoader {
    HttpLoader::new(&LoaderConfig::default()).unwrap()
}

#[tokio::test]
async fn test_load_text_file_by_path_and_file_url() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    fs::write(&path, "Peat bogs and volcanic ash.\n").unwrap();

    let by_path = loader().load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(by_path.text, "Peat bogs and volcanic ash.\n");
    assert_eq!(by_path.content_type, "text/plain");

    let url = format!("file://{}", path.display());
    let by_url = loader().load(&url).await.unwrap();
    assert_eq!(by_url.text, by_path.text);
    assert_eq!(by_url.source, url);
}

#[tokio::test]
async fn test_load_pdf_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("geology.pdf");
    fs::write(&path, minimal_pdf("seattle peat phrase")).unwrap();

    let doc = loader().load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(doc.content_type, MIME_PDF);
    assert!(doc.text.contains("seattle peat phrase"), "got {:?}", doc.text);
}

#[tokio::test]
async fn test_load_docx_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("report.docx");
    fs::write(&path, minimal_docx(&["Glacial till", "Outwash sand"])).unwrap();

    let doc = loader().load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(doc.content_type, MIME_DOCX);
    assert_eq!(doc.text, "Glacial till\nOutwash sand");
}

#[tokio::test]
async fn test_corrupt_pdf_is_fetch_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"not a pdf").unwrap();

    let err = loader().load(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.message.contains("PDF"), "got {}", err);
}

#[tokio::test]
async fn test_file_over_max_bytes_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("big.txt");
    fs::write(&path, "x".repeat(2048)).unwrap();

    let loader = HttpLoader::new(&LoaderConfig {
        max_bytes: 1024,
        ..Default::default()
    })
    .unwrap();
    let err = loader.load(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.message.contains("limit is 1024"), "got {}", err);
}

#[tokio::test]
async fn test_http_pdf_sniffed_despite_octet_stream() {
    let state = MockState {
        pdf: Arc::new(minimal_pdf("remote ash phrase")),
        ..Default::default()
    };
    let base = spawn_mock(state).await;

    let doc = loader()
        .load(&format!("{}/docs/geology.pdf", base))
        .await
        .unwrap();
    assert_eq!(doc.content_type, MIME_PDF);
    assert!(doc.text.contains("remote ash phrase"));
}

#[tokio::test]
async fn test_http_404_is_fetch_error() {
    let base = spawn_mock(MockState::default()).await;
    let url = format!("{}/docs/missing.pdf", base);
    let err = loader().load(&url).await.unwrap_err();
    assert_eq!(err.source_url, url);
    assert!(err.message.contains("404"));
}
