//! End-to-end tests: real loader, embedder, and chat model against a mock
//! OpenAI-compatible server.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{geology_text, keyword_vector, spawn_mock, MockState, MOCK_DIMS, MOCK_REPLY};
use docqa::config::{EmbeddingConfig, LlmConfig, LoaderConfig};
use docqa::embedding::OpenAiEmbedder;
use docqa::llm::ChatModel;
use docqa::loader::HttpLoader;
use docqa::progress::NoProgress;
use docqa::qa::DocumentQa;
use docqa::repl::repl_loop;
use docqa_core::{ChunkingParams, Embedder, PipelineOptions, RagError};
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    doc_path: String,
    state: MockState,
    qa: DocumentQa,
}

async fn fixture(stream: bool) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("geology.txt");
    std::fs::write(&path, geology_text()).unwrap();

    let state = MockState::default();
    let base = spawn_mock(state.clone()).await;

    let embedding = EmbeddingConfig {
        base_url: base.clone(),
        model: Some("mock-embed".to_string()),
        dims: Some(MOCK_DIMS),
        ..Default::default()
    };
    let llm = LlmConfig {
        base_url: base,
        stream,
        ..Default::default()
    };
    let qa = DocumentQa::new(
        Arc::new(HttpLoader::new(&LoaderConfig::default()).unwrap()),
        Arc::new(OpenAiEmbedder::new(&embedding, "test-key".to_string()).unwrap()),
        Arc::new(ChatModel::new(&llm, Some("test-key".to_string())).unwrap()),
        ChunkingParams::new(100, 0).unwrap(),
        PipelineOptions {
            top_k: 2,
            ..Default::default()
        },
        Box::new(NoProgress),
    );

    Fixture {
        _tmp: tmp,
        doc_path: path.to_str().unwrap().to_string(),
        state,
        qa,
    }
}

#[tokio::test]
async fn test_embedder_speaks_openai_protocol() {
    let state = MockState::default();
    let base = spawn_mock(state.clone()).await;
    let embedder = OpenAiEmbedder::new(
        &EmbeddingConfig {
            base_url: base,
            dims: Some(MOCK_DIMS),
            ..Default::default()
        },
        "k".to_string(),
    )
    .unwrap();

    let v = embedder.embed("peat and more peat").await.unwrap();
    assert_eq!(v, keyword_vector("peat and more peat"));
    assert_eq!(embedder.model_name(), "embed-mistral");
}

#[tokio::test]
async fn test_ask_answers_from_relevant_chunk() {
    let mut f = fixture(false).await;

    let answer = f
        .qa
        .ask(&f.doc_path, "Where is the peat?", None)
        .await
        .unwrap();

    assert_eq!(answer.text, MOCK_REPLY);
    assert_eq!(answer.context.len(), 2);
    assert_eq!(answer.context[0].index, 1);
    assert!(answer.context[0].text.starts_with("Peat bogs"));
    // 3 chunks + 1 query.
    assert_eq!(f.state.embed_calls(), 4);
    assert_eq!(f.state.chat_calls(), 1);

    let request = f.state.last_chat();
    assert_eq!(request["model"], "llama3");
    assert_eq!(request["messages"][0]["role"], "system");
    let system = request["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with("You are an assistant for question-answering tasks."));
    assert!(system.contains("Peat bogs formed in kettle depressions"));
    assert_eq!(request["messages"][1]["role"], "user");
    assert_eq!(request["messages"][1]["content"], "Where is the peat?");
}

#[tokio::test]
async fn test_repeat_url_reuses_index_until_invalidated() {
    let mut f = fixture(false).await;

    f.qa.ask(&f.doc_path, "Where is the peat?", None).await.unwrap();
    assert_eq!(f.state.embed_calls(), 4);

    f.qa.ask(&f.doc_path, "Any ash?", Some(1)).await.unwrap();
    assert_eq!(f.state.embed_calls(), 5);

    f.qa.invalidate();
    f.qa.ask(&f.doc_path, "Any till?", None).await.unwrap();
    assert_eq!(f.state.embed_calls(), 9);
}

#[tokio::test]
async fn test_streaming_reply_is_assembled() {
    let mut f = fixture(true).await;
    let answer = f
        .qa
        .ask(&f.doc_path, "Where is the peat?", None)
        .await
        .unwrap();
    assert_eq!(answer.text, MOCK_REPLY);
    assert_eq!(f.state.last_chat()["stream"], true);
}

#[tokio::test]
async fn test_generation_failure_is_not_retried() {
    let mut f = fixture(false).await;
    f.state.fail_chat.store(true, Ordering::SeqCst);

    let err = f
        .qa
        .ask(&f.doc_path, "Where is the peat?", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RagError>(),
        Some(RagError::GenerationFailure(_))
    ));
    assert_eq!(format!("{err:#}").matches("upstream unavailable").count(), 1);
    assert_eq!(f.state.chat_calls(), 1);

    // The index survives: a later load is a cache hit.
    let embeds = f.state.embed_calls();
    let cached = f.qa.load(&f.doc_path).await.unwrap();
    assert_eq!(cached.chunk_count, 3);
    assert_eq!(f.state.embed_calls(), embeds);

    f.state.fail_chat.store(false, Ordering::SeqCst);
    let answer = f.qa.ask(&f.doc_path, "Where is the peat?", None).await.unwrap();
    assert_eq!(answer.context[0].index, 1);
}

#[tokio::test]
async fn test_top_k_zero_is_invalid_configuration() {
    let mut f = fixture(false).await;
    let err = f
        .qa
        .ask(&f.doc_path, "Where is the peat?", Some(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RagError>(),
        Some(RagError::InvalidConfiguration(_))
    ));
    assert_eq!(f.state.chat_calls(), 0);
}

#[tokio::test]
async fn test_repl_survives_failures() {
    let mut f = fixture(false).await;
    let input = "Where is the peat?\n:load /nonexistent/docqa.txt\n:bogus\n:quit\nnever asked\n";
    let mut out = Vec::new();

    repl_loop(&mut f.qa, &f.doc_path, input.as_bytes(), &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("(3 chunks)"), "{out}");
    assert!(out.contains(MOCK_REPLY), "{out}");
    assert!(out.contains("An error occurred: failed to fetch '/nonexistent/docqa.txt'"), "{out}");
    assert!(out.contains("unknown command :bogus"), "{out}");
    assert_eq!(f.state.chat_calls(), 1);
}
