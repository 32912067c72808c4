//! Provider adapters.
//!
//! One module per vendor, each responsible for exactly three things: building
//! the vendor-specific request body, attaching auth from the environment, and
//! extracting a flat answer string from the vendor's nested response shape.
//! Adapter selection dispatches on the typed [`Provider`] enum.
//!
//! Adapters hold no shared mutable state and never write to the audit trail;
//! their only side effect is the outbound HTTP call.

mod anthropic;
mod google;
mod openai;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::ProviderError;
use crate::policy::{Provider, RouteSpec};

/// Default per-call timeout. Each network call is wrapped individually; a
/// timeout aborts the in-flight request and surfaces as a [`ProviderError`]
/// so the fallback executor can advance.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Normalized result of one vendor call.
///
/// `raw` is kept for diagnostics only; downstream components read `text`
/// exclusively. `text` is non-empty by construction: an empty extraction is a
/// [`ProviderError::EmptyText`], never a hollow success.
#[derive(Debug, Clone)]
pub struct ProviderCallResult {
    pub raw: Value,
    pub text: String,
}

/// Vendor-agnostic call surface: given a spec, a system instruction, and a
/// user message, return response text or fail.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn call(
        &self,
        spec: &RouteSpec,
        system: &str,
        user: &str,
    ) -> Result<ProviderCallResult, ProviderError>;
}

/// Stateless HTTP client dispatching to the per-vendor adapters.
pub struct HttpProviderClient {
    client: Client,
    timeout: Duration,
}

impl HttpProviderClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

impl Default for HttpProviderClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn call(
        &self,
        spec: &RouteSpec,
        system: &str,
        user: &str,
    ) -> Result<ProviderCallResult, ProviderError> {
        tracing::debug!("calling {} model={}", spec.provider, spec.model);
        match spec.provider {
            Provider::Anthropic => {
                anthropic::call(&self.client, spec, system, user, self.timeout).await
            }
            Provider::Google => google::call(&self.client, spec, system, user, self.timeout).await,
            Provider::OpenAi => openai::call(&self.client, spec, system, user, self.timeout).await,
        }
    }
}

/// Read the vendor's API key from the environment.
fn credential(provider: Provider) -> Result<String, ProviderError> {
    let var = provider.credential_var();
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ProviderError::MissingCredential { provider, var })
}

/// Send a prepared request and return the parsed JSON body.
///
/// Translates transport failures, non-2xx statuses, and unparseable bodies
/// into the matching [`ProviderError`] variants.
async fn send(
    provider: Provider,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, ProviderError> {
    let response = request.timeout(timeout).send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("request failed: {e}")
        };
        ProviderError::Network { provider, message }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Network {
            provider,
            message: format!("failed to read response body: {e}"),
        })?;

    if !status.is_success() {
        return Err(ProviderError::Http {
            provider,
            status: status.as_u16(),
            body: truncate(&body, 300),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
        provider,
        message: format!("invalid JSON: {e}"),
    })
}

/// Wrap a vendor extraction into the normalized result, rejecting empty text.
fn finish(provider: Provider, raw: Value, text: String) -> Result<ProviderCallResult, ProviderError> {
    if text.trim().is_empty() {
        return Err(ProviderError::EmptyText { provider });
    }
    Ok(ProviderCallResult { raw, text })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_extraction_is_an_error() {
        let err = finish(Provider::Anthropic, Value::Null, "   ".to_string()).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyText { .. }));

        let ok = finish(Provider::Anthropic, Value::Null, "answer".to_string()).unwrap();
        assert_eq!(ok.text, "answer");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 300), "short");
    }
}
