//! Error taxonomy for the router pipeline.
//!
//! Only two errors ever reach the caller: [`RouterError::InvalidInput`] and
//! [`RouterError::AllProvidersFailed`]. Everything else is caught by the
//! component that owns it, logged, and converted into a fallback advance or a
//! degraded (unverified) result.

use thiserror::Error;

use crate::policy::Provider;

/// Errors surfaced to the caller of the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The request was rejected before any classification or network activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every entry in the fallback chain failed or returned empty text.
    /// The audit log holds one failure line per attempted entry.
    #[error("all providers failed ({attempts} attempts); see the audit log for details")]
    AllProvidersFailed { attempts: usize },
}

pub type RouterResult<T> = Result<T, RouterError>;

/// A single vendor call failed. Recoverable: the fallback executor advances
/// to the next entry, and the verification loop degrades to the last draft.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} credential missing: {var} is not set")]
    MissingCredential { provider: Provider, var: &'static str },

    #[error("{provider} HTTP {status}: {body}")]
    Http {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Network { provider: Provider, message: String },

    #[error("{provider} response did not parse: {message}")]
    Parse { provider: Provider, message: String },

    #[error("{provider} returned empty response text")]
    EmptyText { provider: Provider },
}

impl ProviderError {
    /// The provider whose call produced this error.
    pub fn provider(&self) -> Provider {
        match self {
            Self::MissingCredential { provider, .. }
            | Self::Http { provider, .. }
            | Self::Network { provider, .. }
            | Self::Parse { provider, .. }
            | Self::EmptyText { provider } => *provider,
        }
    }

    /// HTTP status code, when the failure came from a non-2xx response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
