//! Router configuration.
//!
//! Everything tunable lives here: per-call timeout, fix-round ceiling,
//! long-prompt threshold, audit log path, the fallback chain, and the routing
//! table itself. Loaded from a JSON file when one is given; environment
//! variables fill in defaults otherwise.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::DEFAULT_LONG_PROMPT_THRESHOLD;
use crate::policy::{Provider, RouteSpec, RoutingTable};

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_FIX_ROUNDS: u32 = 2;
const DEFAULT_AUDIT_LOG: &str = "model_router.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-call timeout in seconds. Also the unit the worst-case latency sums
    /// over: attempts are sequential, never parallel.
    pub timeout_secs: u64,
    /// Upper bound on fix rounds in the verification loop.
    pub max_fix_rounds: u32,
    /// Prompts longer than this many characters are classified as long.
    pub long_prompt_threshold: usize,
    /// Append-only audit trail destination.
    pub audit_log_path: PathBuf,
    /// Fallback specs tried after the routed primary. Spans more than one
    /// provider so a single vendor outage cannot stall the whole chain.
    pub fallbacks: Vec<RouteSpec>,
    /// Kind → model-pair routing table.
    pub routes: RoutingTable,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_fix_rounds: DEFAULT_MAX_FIX_ROUNDS,
            long_prompt_threshold: DEFAULT_LONG_PROMPT_THRESHOLD,
            audit_log_path: std::env::var("MODEL_ROUTER_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_AUDIT_LOG)),
            fallbacks: vec![
                RouteSpec::new(Provider::Anthropic, "claude-sonnet-4.5-thinking"),
                RouteSpec::new(Provider::Google, "gemini-3-flash"),
            ],
            routes: RoutingTable::default(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Load from `path` when given, falling back to defaults on absence.
    /// A present-but-broken config file is an error, not a silent default.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, std::io::Error> {
        match path {
            Some(p) => {
                let config = Self::load(p)?;
                tracing::info!("loaded router config from {}", p.display());
                Ok(config)
            }
            None => {
                tracing::debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_span_two_providers() {
        let config = RouterConfig::default();
        let providers: std::collections::HashSet<_> =
            config.fallbacks.iter().map(|s| s.provider).collect();
        assert!(providers.len() >= 2);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.json");
        std::fs::write(&path, r#"{ "timeout_secs": 30, "max_fix_rounds": 1 }"#).unwrap();

        let config = RouterConfig::load(&path).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_fix_rounds, 1);
        assert_eq!(config.long_prompt_threshold, DEFAULT_LONG_PROMPT_THRESHOLD);
        assert_eq!(config.fallbacks.len(), 2);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(RouterConfig::load_or_default(Some(&path)).is_err());
    }
}
