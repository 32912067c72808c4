//! Google Gemini (Generative Language API) adapter.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{credential, finish, send, ProviderCallResult};
use crate::error::ProviderError;
use crate::policy::{Provider, RouteSpec};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// generateContent request body. The API has no dedicated system slot in this
/// shape, so the system instruction is prefixed into the user part.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

/// The subset of the generateContent response we read. The text usually lives
/// in `candidates[0].content.parts`; some variants put a plain string in
/// `candidates[0].output` instead.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn extract_text(&self) -> String {
        let Some(candidate) = self.candidates.first() else {
            return String::new();
        };
        if let Some(content) = &candidate.content {
            let text: String = content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            if !text.is_empty() {
                return text;
            }
        }
        candidate.output.clone().unwrap_or_default()
    }
}

pub(super) async fn call(
    client: &Client,
    spec: &RouteSpec,
    system: &str,
    user: &str,
    timeout: Duration,
) -> Result<ProviderCallResult, ProviderError> {
    let provider = Provider::Google;
    let key = credential(provider)?;

    let url = format!(
        "{API_BASE}/{}:generateContent?key={}",
        urlencoding::encode(&spec.model),
        urlencoding::encode(&key)
    );

    let text = if system.is_empty() {
        user.to_string()
    } else {
        format!("SYSTEM:\n{system}\n\n{user}")
    };
    let body = GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![TextPart { text }],
        }],
    };

    let raw = send(provider, client.post(url).json(&body), timeout).await?;
    let parsed: GenerateResponse =
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
    fn extracts_candidate_parts() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "first " }, { "text": "second" }] }
            }]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.extract_text(), "first second");
    }

    #[test]
    fn falls_back_to_output_string() {
        let raw = serde_json::json!({
            "candidates": [{ "output": "plain output" }]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.extract_text(), "plain output");
    }

    #[test]
    fn no_candidates_yields_empty_text() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed.extract_text(), "");
    }
}
