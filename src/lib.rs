//! # Model Router
//!
//! Task-aware routing of natural-language prompts across AI providers.
//!
//! The pipeline is one sequential chain per request:
//!
//! ```text
//! prompt ─► classify ─► route ─► fallback execute ─► [verify / fix] ─► response
//! ```
//!
//! ## Modules
//! - `classify`: deterministic keyword classifier producing a task descriptor
//! - `policy`: static routing table mapping task kinds to model pairs
//! - `providers`: one adapter per vendor behind the `ProviderClient` trait
//! - `executor`: sequential fallback chain, first non-empty answer wins
//! - `verify`: bounded verify-and-correct loop, advisory only
//! - `audit`: append-only audit trail of every decision and call attempt
//!
//! Every invocation is stateless; nothing survives across requests.

pub mod audit;
pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod policy;
pub mod providers;
pub mod router;
pub mod verify;

pub use config::RouterConfig;
pub use error::{ProviderError, RouterError};
pub use router::{RequestMeta, Router, RouterRequest, RouterResponse};
