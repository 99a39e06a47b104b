use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

const API_NAME: &str = "query_memes";

/// What the hosted demo answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMeme {
    /// HTML snippet embedding the meme video/image
    pub rendering_fragment: String,
    pub description: String,
}

#[derive(Deserialize)]
struct EventId {
    event_id: String,
}

/// Client for the public meme-search demo running as a Gradio space
pub struct GradioSpaceClient {
    client: reqwest::Client,
    base_url: String,
}

impl GradioSpaceClient {
    /// Client for `space` ("owner/name"); `base_url` overrides the derived host
    pub fn new(space: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| space_url(space));
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the space for a meme matching `user_input`
    pub async fn predict(&self, user_input: &str) -> Result<HostedMeme> {
        let call_url = format!("{}/gradio_api/call/{}", self.base_url, API_NAME);

        let response = self
            .client
            .post(&call_url)
            .json(&serde_json::json!({ "data": [user_input] }))
            .send()
            .await
            .context("Failed to connect to Gradio space")?;

        if !response.status().is_success() {
            anyhow::bail!("Gradio API returned error: {}", response.status());
        }

        let EventId { event_id } = response
            .json::<EventId>()
            .await
            .context("Failed to parse Gradio call response")?;
        tracing::debug!(event_id = %event_id, "Gradio call queued");

        let stream = self
            .client
            .get(format!("{}/{}", call_url, event_id))
            .send()
            .await
            .context("Failed to fetch Gradio result")?;

        if !stream.status().is_success() {
            anyhow::bail!("Gradio result stream returned error: {}", stream.status());
        }

        let body = stream.text().await.context("Failed to read Gradio result stream")?;
        parse_event_stream(&body)
    }
}

/// `owner/some_name` → `https://owner-some-name.hf.space`
pub fn space_url(space: &str) -> String {
    let host: String = space
        .chars()
        .map(|c| match c {
            '/' | '_' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    format!("https://{}.hf.space", host)
}

/// Pull the final payload out of a Gradio server-sent event stream
pub fn parse_event_stream(body: &str) -> Result<HostedMeme> {
    let mut event = "";
    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            match event {
                "complete" => return parse_payload(data.trim()),
                "error" => anyhow::bail!("Gradio space reported an error: {}", data.trim()),
                _ => {}
            }
        }
    }
    anyhow::bail!("Gradio result stream ended without a result")
}

fn parse_payload(data: &str) -> Result<HostedMeme> {
    let values: Vec<Value> = serde_json::from_str(data).context("Failed to parse Gradio payload")?;
    match values.as_slice() {
        [Value::String(fragment), Value::String(description)] => Ok(HostedMeme {
            rendering_fragment: fragment.clone(),
            description: description.clone(),
        }),
        _ => anyhow::bail!("Unexpected Gradio payload: {}", data),
    }
}
