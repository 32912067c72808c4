//! Anthropic Messages API adapter.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{credential, finish, send, ProviderCallResult};
use crate::error::ProviderError;
use crate::policy::{Provider, RouteSpec};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u64 = 1200;

/// Messages API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u64,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// The subset of the Messages API response we read: a list of content blocks
/// whose text fields concatenate into the answer.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn extract_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

pub(super) async fn call(
    client: &Client,
    spec: &RouteSpec,
    system: &str,
    user: &str,
    timeout: Duration,
) -> Result<ProviderCallResult, ProviderError> {
    let provider = Provider::Anthropic;
    let key = credential(provider)?;

    let body = MessagesRequest {
        model: &spec.model,
        max_tokens: MAX_TOKENS,
        system,
        messages: vec![Message {
            role: "user",
            content: user,
        }],
    };

    let request = client
        .post(API_URL)
        .header("x-api-key", key)
        .header("anthropic-version", API_VERSION)
        .json(&body);

    let raw = send(provider, request, timeout).await?;
    let parsed: MessagesResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Parse {
            provider,
            message: format!("unexpected response shape: {e}"),
        })?;

    finish(provider, raw, parsed.extract_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_joins_content_blocks() {
        let raw = serde_json::json!({
            "content": [
                { "type": "text", "text": "Hello " },
                { "type": "text", "text": "world" },
                { "type": "tool_use" }
            ]
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.extract_text(), "Hello world");
    }

    #[test]
    fn missing_content_yields_empty_text() {
        let parsed: MessagesResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed.extract_text(), "");
    }
}
