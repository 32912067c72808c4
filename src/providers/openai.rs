//! OpenAI Chat Completions adapter.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{credential, finish, send, ProviderCallResult};
use crate::error::ProviderError;
use crate::policy::{Provider, RouteSpec};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// The subset of the chat completions response we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn extract_text(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .unwrap_or_default()
    }
}

pub(super) async fn call(
    client: &Client,
    spec: &RouteSpec,
    system: &str,
    user: &str,
    timeout: Duration,
) -> Result<ProviderCallResult, ProviderError> {
    let provider = Provider::OpenAi;
    let key = credential(provider)?;

    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: user,
    });

    let body = ChatRequest {
        model: &spec.model,
        messages,
        temperature: TEMPERATURE,
    };

    let request = client
        .post(API_URL)
        .header("Authorization", format!("Bearer {key}"))
        .json(&body);

    let raw = send(provider, request, timeout).await?;
    let parsed: ChatResponse =
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
    fn extracts_first_choice_message() {
        let raw = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "the answer" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.extract_text(), "the answer");
    }

    #[test]
    fn null_content_yields_empty_text() {
        let raw = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.extract_text(), "");
    }
}
