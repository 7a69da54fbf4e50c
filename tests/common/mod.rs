//! Shared fixtures: a mock OpenAI-compatible server and document builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const MOCK_DIMS: usize = 4;
pub const MOCK_REPLY: &str = "The peat is in kettle depressions.";

/// Three 100-character blocks, one topic each.
pub fn geology_text() -> String {
    [
        "Volcanic ash from Glacier Peak fell across the region; ash layers are thin.",
        "Peat bogs formed in kettle depressions; the peat is soft and compressible.",
        "Glacial till blankets the uplands, and till is dense and poorly drained.",
    ]
    .iter()
    .map(|s| format!("{:<100}", s))
    .collect()
}

/// Keyword-count embedding: occurrences of "peat", "ash", "till", plus a bias.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v: Vec<f32> = ["peat", "ash", "till"]
        .iter()
        .map(|k| lower.matches(k).count() as f32)
        .collect();
    v.push(1.0);
    v
}

#[derive(Clone, Default)]
pub struct MockState {
    pub embed_calls: Arc<AtomicUsize>,
    pub chat_calls: Arc<AtomicUsize>,
    pub fail_chat: Arc<AtomicBool>,
    pub last_chat: Arc<Mutex<Option<Value>>>,
    pub pdf: Arc<Vec<u8>>,
}

impl MockState {
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_chat(&self) -> Value {
        self.last_chat.lock().unwrap().clone().unwrap_or(Value::Null)
    }
}

async fn embeddings(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.embed_calls.fetch_add(1, Ordering::SeqCst);
    let data: Vec<Value> = body["input"]
        .as_array()
        .map(|inputs| {
            inputs
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    json!({
                        "object": "embedding",
                        "index": i,
                        "embedding": keyword_vector(t.as_str().unwrap_or_default()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "object": "list", "data": data, "model": body["model"] }))
}

async fn chat_completions(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.chat_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_chat.lock().unwrap() = Some(body.clone());

    if state.fail_chat.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable").into_response();
    }

    if body["stream"] == json!(true) {
        let (head, tail) = MOCK_REPLY.split_at(8);
        let events = [
            json!({"choices": [{"index": 0, "delta": {"role": "assistant"}}]}),
            json!({"choices": [{"index": 0, "delta": {"content": head}}]}),
            json!({"choices": [{"index": 0, "delta": {"content": tail}}]}),
        ];
        let mut sse = String::new();
        for event in events {
            sse.push_str(&format!("data: {}\n\n", event));
        }
        sse.push_str("data: [DONE]\n\n");
        return ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response();
    }

    Json(json!({
        "object": "chat.completion",
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": MOCK_REPLY},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn pdf_document(State(state): State<MockState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        state.pdf.as_ref().clone(),
    )
        .into_response()
}

/// Serve the mock on an ephemeral port; returns its base URL.
pub async fn spawn_mock(state: MockState) -> String {
    let app = Router::new()
        .route("/embeddings", post(embeddings))
        .route("/chat/completions", post(chat_completions))
        .route("/docs/geology.pdf", get(pdf_document))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Minimal valid PDF showing `phrase` on one page.
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
pub fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Minimal docx (ZIP) whose `word/document.xml` holds one paragraph per item.
pub fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}
