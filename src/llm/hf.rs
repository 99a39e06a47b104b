use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat completions over the Hugging Face inference router
///
/// Speaks the OpenAI-compatible `/chat/completions` protocol, so any server
/// implementing it (TGI, vLLM, Ollama's `/v1`) can stand in by changing the
/// base URL.
pub struct HfInferenceProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HfInferenceProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout = timeout_secs.map(Duration::from_secs);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl LlmProvider for HfInferenceProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .context("Failed to connect to inference endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned error {}: {}", status, error_text);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        completion
            .choices
            .into_iter()
            .next()
            .context("Chat completion contained no choices")?
            .message
            .content
            .context("Chat completion message has no content")
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::system("pick one"), ChatMessage::user("Text: \"hi\"")],
            max_tokens: 10,
            temperature: 0.1,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_openai_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(serde_json::json!({
                "model": "Qwen/Qwen2.5-72B-Instruct",
                "max_tokens": 10,
                "messages": [
                    { "role": "system", "content": "pick one" },
                    { "role": "user", "content": "Text: \"hi\"" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("2")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HfInferenceProvider::new(
            &format!("{}/v1/", server.uri()),
            "Qwen/Qwen2.5-72B-Instruct",
            Some("hf_test".to_string()),
        );
        assert!(provider.has_api_key());
        assert_eq!(provider.model(), "Qwen/Qwen2.5-72B-Instruct");

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply, "2");
    }

    #[tokio::test]
    async fn test_complete_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = HfInferenceProvider::new(&server.uri(), "m", None);
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = HfInferenceProvider::new(&server.uri(), "m", None);
        assert!(provider.complete(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_complete_unreachable_server() {
        let provider = HfInferenceProvider::new("http://127.0.0.1:9", "m", None);
        assert!(provider.complete(&request()).await.is_err());
    }
}
