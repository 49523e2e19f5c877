//! OpenAI client wire behavior against a mock HTTP server.

use finreport_rag::{ChatModel, EmbeddingProvider, OpenAiChat, OpenAiEmbeddings, RagError};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn embed_posts_the_expected_request_and_parses_the_vector() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    json!({
                        "model": "text-embedding-ada-002",
                        "input": "Revenue was $5M."
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3] }]
            }));
        })
        .await;

    let provider =
        OpenAiEmbeddings::new("test-key").unwrap().with_base_url(server.base_url());
    let embedding = provider.embed("Revenue was $5M.").await.unwrap();

    mock.assert_async().await;
    assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(provider.dimensions(), 1536);
}

#[tokio::test]
async fn embed_surfaces_the_api_error_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(401).json_body(json!({
                "error": { "message": "bad key" }
            }));
        })
        .await;

    let provider =
        OpenAiEmbeddings::new("wrong-key").unwrap().with_base_url(server.base_url());
    let err = provider.embed("text").await.unwrap_err();

    match err {
        RagError::Embedding { provider, message } => {
            assert_eq!(provider, "OpenAI");
            assert!(message.contains("401"), "message should carry the status: {message}");
            assert!(message.contains("bad key"), "message should carry the detail: {message}");
        }
        other => panic!("expected an embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn embed_rejects_an_empty_data_array() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;

    let provider = OpenAiEmbeddings::new("test-key").unwrap().with_base_url(server.base_url());
    assert!(matches!(
        provider.embed("text").await,
        Err(RagError::Embedding { .. })
    ));
}

#[tokio::test]
async fn complete_sends_a_single_user_message_at_temperature_zero() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    json!({
                        "model": "gpt-3.5-turbo",
                        "temperature": 0.0,
                        "messages": [{ "role": "user", "content": "What was Q1 revenue?" }]
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({
                "choices": [{ "message": { "content": "Q1 revenue was $5M." } }]
            }));
        })
        .await;

    let chat = OpenAiChat::new("test-key").unwrap().with_base_url(server.base_url());
    let answer = chat.complete("What was Q1 revenue?").await.unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "Q1 revenue was $5M.");
}

#[tokio::test]
async fn complete_maps_api_failures_to_generation_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).json_body(json!({
                "error": { "message": "rate limit exceeded" }
            }));
        })
        .await;

    let chat = OpenAiChat::new("test-key").unwrap().with_base_url(server.base_url());
    let err = chat.complete("question").await.unwrap_err();

    match err {
        RagError::Generation { message, .. } => {
            assert!(message.contains("rate limit exceeded"), "got: {message}");
        }
        other => panic!("expected a generation error, got {other:?}"),
    }
}

#[test]
fn empty_api_keys_are_rejected_at_construction() {
    assert!(matches!(OpenAiEmbeddings::new(""), Err(RagError::Config(_))));
    assert!(matches!(OpenAiChat::new(""), Err(RagError::Config(_))));
}
