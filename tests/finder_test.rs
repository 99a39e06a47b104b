//! End-to-end lookups through the public API, with the embedding and chat
//! services served by a local mock HTTP server.

use indicatif::ProgressBar;
use memefinder::config::Config;
use memefinder::embeddings::TeiEmbeddingProvider;
use memefinder::index::{LocalVectorIndex, VectorIndex};
use memefinder::llm::HfInferenceProvider;
use memefinder::matcher::{FinderContext, LlmMatcher, LlmSettings, StalePolicy};
use memefinder::{Catalogue, MatchError, MemeFinder, Upstream};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CAT: &str = "a cat falling off a table";
const DOG: &str = "a dog running in circles";
const QUERY: &str = "a pet is chasing its tail";

fn pets() -> Catalogue {
    Catalogue::from_pairs([("cat.png", CAT), ("dog.png", DOG)])
}

/// TEI stand-in: the catalogue batch, the query, and each description alone
async fn mock_tei() -> MockServer {
    let server = MockServer::start().await;
    let embeds = [
        (json!([CAT, DOG]), json!([[1.0, 0.0], [0.0, 1.0]])),
        (json!([QUERY]), json!([[0.2, 0.9]])),
        (json!([CAT]), json!([[1.0, 0.0]])),
        (json!([DOG]), json!([[0.0, 1.0]])),
    ];
    for (inputs, vectors) in embeds {
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(json!({ "inputs": inputs, "truncate": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vectors))
            .mount(&server)
            .await;
    }
    server
}

async fn mock_chat(reply: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "test-model", "max_tokens": 10 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        })))
        .mount(&server)
        .await;
    server
}

async fn context(tei: &MockServer, dir: &TempDir, catalogue: Catalogue) -> FinderContext {
    let embedder = Arc::new(TeiEmbeddingProvider::new(Some(tei.uri().as_str()), Some(2)));
    let index = Arc::new(LocalVectorIndex::open(dir.path(), "memes").await.unwrap());
    FinderContext::initialize(catalogue, embedder, index, StalePolicy::Keep)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_similarity_end_to_end() {
    let tei = mock_tei().await;
    let dir = TempDir::new().unwrap();
    let finder = MemeFinder::with_similarity(context(&tei, &dir, pets()).await);

    let meme = finder.find_relevant_meme(QUERY, 1).await.unwrap();
    assert_eq!(meme.filename, "dog.png");
    assert_eq!(meme.description, DOG);
    assert!(!meme.llm_selected);

    let again = finder.find_relevant_meme(QUERY, 1).await.unwrap();
    assert_eq!(meme, again);
}

#[tokio::test]
async fn test_llm_end_to_end() {
    let tei = mock_tei().await;
    let chat = mock_chat("2").await;
    let dir = TempDir::new().unwrap();

    let provider = Arc::new(HfInferenceProvider::new(&format!("{}/v1", chat.uri()), "test-model", None));
    let matcher = LlmMatcher::new(provider, LlmSettings::default());
    let finder = MemeFinder::with_llm(context(&tei, &dir, pets()).await, matcher);

    let result = finder.find_relevant_meme_result(QUERY, 1).await;
    assert_eq!(result.filename.as_deref(), Some("dog.png"));
    assert!(result.llm_selected);
    assert!(result.error.is_none());

    let score = result.similarity_score.unwrap();
    let expected = 0.9 / (0.2f32 * 0.2 + 0.9 * 0.9).sqrt();
    assert!((score - expected).abs() < 1e-4);
}

#[tokio::test]
async fn test_blank_query_with_tei() {
    let tei = mock_tei().await;
    let chat = mock_chat("1").await;

    let dir = TempDir::new().unwrap();
    let similarity = MemeFinder::with_similarity(context(&tei, &dir, pets()).await);
    assert_eq!(similarity.find_relevant_meme("", 1).await, Err(MatchError::NoMatch));

    let dir = TempDir::new().unwrap();
    let provider = Arc::new(HfInferenceProvider::new(&format!("{}/v1", chat.uri()), "test-model", None));
    let llm = MemeFinder::with_llm(
        context(&tei, &dir, pets()).await,
        LlmMatcher::new(provider, LlmSettings::default()),
    );

    // TEI refuses blank text, but the model's pick still stands
    let result = llm.find_relevant_meme_result("", 1).await;
    assert_eq!(result.filename.as_deref(), Some("cat.png"));
    assert!(result.llm_selected);
    assert_eq!(result.similarity_score, Some(0.0));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_llm_unreachable_model_is_reported() {
    let tei = mock_tei().await;
    let dir = TempDir::new().unwrap();

    let provider = Arc::new(HfInferenceProvider::new("http://127.0.0.1:9/v1", "test-model", None));
    let finder = MemeFinder::with_llm(
        context(&tei, &dir, pets()).await,
        LlmMatcher::new(provider, LlmSettings::default()),
    );

    match finder.find_relevant_meme(QUERY, 1).await {
        Err(MatchError::UpstreamFailure { origin, .. }) => assert_eq!(origin, Upstream::Llm),
        other => panic!("expected upstream failure, got {:?}", other),
    }

    let result = finder.find_relevant_meme_result(QUERY, 1).await;
    assert!(result.filename.is_none());
    assert!(result
        .error
        .unwrap()
        .starts_with("Error processing LLM response: "));
}

#[tokio::test]
async fn test_empty_catalogue_never_matches() {
    let tei = mock_tei().await;
    let chat = mock_chat("1").await;

    let dir = TempDir::new().unwrap();
    let similarity = MemeFinder::with_similarity(context(&tei, &dir, Catalogue::default()).await);
    assert_eq!(similarity.find_relevant_meme(QUERY, 1).await, Err(MatchError::NoMatch));

    let dir = TempDir::new().unwrap();
    let provider = Arc::new(HfInferenceProvider::new(&format!("{}/v1", chat.uri()), "test-model", None));
    let llm = MemeFinder::with_llm(
        context(&tei, &dir, Catalogue::default()).await,
        LlmMatcher::new(provider, LlmSettings::default()),
    );
    assert_eq!(llm.find_relevant_meme(QUERY, 1).await, Err(MatchError::NoMatch));
}

#[tokio::test]
async fn test_from_config_builds_and_reuses_index() {
    let tei = mock_tei().await;
    let dir = TempDir::new().unwrap();
    let catalogue_path = dir.path().join("memes.csv");
    std::fs::write(
        &catalogue_path,
        format!("filename,description\ncat.png,{}\ndog.png,{}\n", CAT, DOG),
    )
    .unwrap();

    let mut config = Config::default();
    config.catalogue.path = catalogue_path.display().to_string();
    config.index.dir = dir.path().join("index").display().to_string();
    config.tei.url = tei.uri();
    config.tei.dims = 2;
    config.llm.enabled = false;

    let finder = MemeFinder::from_config(&config, &ProgressBar::hidden()).await.unwrap();
    assert!(!finder.uses_llm());
    assert_eq!(finder.context().catalogue().len(), 2);
    assert_eq!(finder.context().index().count().await.unwrap(), 2);
    assert_eq!(finder.find_relevant_meme(QUERY, 1).await.unwrap().filename, "dog.png");
    drop(finder);

    // warm start reads the stored vectors back
    let index = LocalVectorIndex::open(dir.path().join("index"), "memes").await.unwrap();
    assert_eq!(index.count().await.unwrap(), 2);
    assert_eq!(index.fingerprint().await.unwrap(), Some(pets().fingerprint()));

    let finder = MemeFinder::from_config(&config, &ProgressBar::hidden()).await.unwrap();
    assert_eq!(finder.find_relevant_meme(QUERY, 1).await.unwrap().filename, "dog.png");
}

#[tokio::test]
async fn test_from_config_missing_catalogue_fails() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.catalogue.path = dir.path().join("nope.csv").display().to_string();
    config.index.dir = dir.path().join("index").display().to_string();

    assert!(MemeFinder::from_config(&config, &ProgressBar::hidden()).await.is_err());
}
