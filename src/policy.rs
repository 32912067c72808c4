//! Routing policy.
//!
//! Pure table lookup from task kind to a `(primary, verifier)` model pair.
//! The table is configuration data: it deserializes from the config file and
//! can be swapped without touching any other component. Nothing here performs
//! fallback or I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classify::{TaskDescriptor, TaskKind};

/// Supported AI vendors. Adapter selection dispatches on this enum, never on
/// provider name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Google,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable holding this vendor's API key.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One routable backend: a vendor plus a model id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub provider: Provider,
    pub model: String,
}

impl RouteSpec {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl std::fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// The model pair chosen for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub primary: RouteSpec,
    pub verifier: RouteSpec,
}

/// Per-kind routing entry. `primary_upgraded`, when present, replaces
/// `primary` for strict or long tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindRoute {
    pub primary: RouteSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_upgraded: Option<RouteSpec>,
    pub verifier: RouteSpec,
}

/// The static kind → model-pair table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: HashMap<TaskKind, KindRoute>,
}

// Model ids used by the built-in table.
const CLAUDE_OPUS_THINKING: &str = "claude-opus-4.6-thinking";
const CLAUDE_SONNET_THINKING: &str = "claude-sonnet-4.5-thinking";
const CLAUDE_SONNET: &str = "claude-sonnet-4.5";
const GEMINI_PRO: &str = "gemini-3-pro-high";
const GEMINI_FLASH: &str = "gemini-3-flash";

fn anthropic(model: &str) -> RouteSpec {
    RouteSpec::new(Provider::Anthropic, model)
}

fn google(model: &str) -> RouteSpec {
    RouteSpec::new(Provider::Google, model)
}

impl Default for RoutingTable {
    /// Built-in pairing: primary is fast and strong, verifier is the stricter
    /// "thinking" variant. Strict or long tasks upgrade the primary where an
    /// upgraded entry exists.
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            TaskKind::Debug,
            KindRoute {
                primary: anthropic(CLAUDE_SONNET_THINKING),
                primary_upgraded: Some(anthropic(CLAUDE_OPUS_THINKING)),
                verifier: anthropic(CLAUDE_OPUS_THINKING),
            },
        );
        routes.insert(
            TaskKind::Security,
            KindRoute {
                primary: anthropic(CLAUDE_OPUS_THINKING),
                primary_upgraded: None,
                verifier: anthropic(CLAUDE_OPUS_THINKING),
            },
        );
        routes.insert(
            TaskKind::Payments,
            KindRoute {
                primary: anthropic(CLAUDE_SONNET_THINKING),
                primary_upgraded: None,
                verifier: anthropic(CLAUDE_OPUS_THINKING),
            },
        );
        routes.insert(
            TaskKind::Database,
            KindRoute {
                primary: anthropic(CLAUDE_SONNET),
                primary_upgraded: Some(anthropic(CLAUDE_SONNET_THINKING)),
                verifier: anthropic(CLAUDE_SONNET_THINKING),
            },
        );
        routes.insert(
            TaskKind::Vision,
            KindRoute {
                primary: google(GEMINI_PRO),
                primary_upgraded: None,
                verifier: anthropic(CLAUDE_SONNET_THINKING),
            },
        );
        routes.insert(
            TaskKind::Writing,
            KindRoute {
                primary: google(GEMINI_FLASH),
                primary_upgraded: None,
                verifier: anthropic(CLAUDE_SONNET),
            },
        );
        routes.insert(
            TaskKind::General,
            KindRoute {
                primary: anthropic(CLAUDE_SONNET),
                primary_upgraded: Some(anthropic(CLAUDE_SONNET_THINKING)),
                verifier: anthropic(CLAUDE_SONNET_THINKING),
            },
        );
        Self { routes }
    }
}

impl RoutingTable {
    /// Look up the model pair for a task. Pure and idempotent.
    ///
    /// Kinds missing from a custom table fall back to its `general` entry;
    /// a table without a `general` entry falls back to the built-in one.
    pub fn route(&self, task: &TaskDescriptor) -> RoutePlan {
        let entry = self
            .routes
            .get(&task.kind)
            .or_else(|| self.routes.get(&TaskKind::General))
            .cloned()
            .unwrap_or_else(|| {
                Self::default()
                    .routes
                    .remove(&TaskKind::General)
                    .expect("built-in table always has a general entry")
            });

        let primary = if task.strict || task.long {
            entry.primary_upgraded.unwrap_or(entry.primary)
        } else {
            entry.primary
        };

        RoutePlan {
            primary,
            verifier: entry.verifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(kind: TaskKind, strict: bool, long: bool) -> TaskDescriptor {
        TaskDescriptor {
            kind,
            strict,
            long,
            needs_vision: kind == TaskKind::Vision,
        }
    }

    #[test]
    fn route_is_idempotent() {
        let table = RoutingTable::default();
        let t = task(TaskKind::Debug, true, false);
        assert_eq!(table.route(&t), table.route(&t));
    }

    #[test]
    fn strict_or_long_upgrades_primary() {
        let table = RoutingTable::default();

        let relaxed = table.route(&task(TaskKind::Debug, false, false));
        assert_eq!(relaxed.primary.model, CLAUDE_SONNET_THINKING);

        let strict = table.route(&task(TaskKind::Debug, true, false));
        assert_eq!(strict.primary.model, CLAUDE_OPUS_THINKING);

        let long = table.route(&task(TaskKind::Debug, false, true));
        assert_eq!(long.primary.model, CLAUDE_OPUS_THINKING);
    }

    #[test]
    fn vision_routes_to_google_primary() {
        let plan = RoutingTable::default().route(&task(TaskKind::Vision, false, false));
        assert_eq!(plan.primary.provider, Provider::Google);
        assert_eq!(plan.verifier.provider, Provider::Anthropic);
    }

    #[test]
    fn missing_kind_falls_back_to_general() {
        // A custom table that only defines the general entry.
        let json = r#"{
            "general": {
                "primary": { "provider": "openai", "model": "gpt-test" },
                "verifier": { "provider": "anthropic", "model": "claude-test" }
            }
        }"#;
        let table: RoutingTable = serde_json::from_str(json).unwrap();

        let plan = table.route(&task(TaskKind::Writing, false, false));
        assert_eq!(plan.primary, RouteSpec::new(Provider::OpenAi, "gpt-test"));
    }

    #[test]
    fn empty_table_falls_back_to_builtin_general() {
        let table: RoutingTable = serde_json::from_str("{}").unwrap();
        let plan = table.route(&task(TaskKind::General, false, false));
        assert_eq!(plan.primary.provider, Provider::Anthropic);
    }
}
