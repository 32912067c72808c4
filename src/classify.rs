//! Task classification.
//!
//! Cheap, deterministic keyword heuristics. Pure: no I/O, no state, same
//! descriptor for the same input every time. The keyword sets can be expanded
//! at any time without touching the rest of the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RouterError, RouterResult};

/// Prompts longer than this many characters are treated as long-form.
pub const DEFAULT_LONG_PROMPT_THRESHOLD: usize = 1800;

/// Coarse category assigned to a prompt, driving model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Debug,
    Security,
    Payments,
    Database,
    Vision,
    Writing,
    General,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Security => "security",
            Self::Payments => "payments",
            Self::Database => "database",
            Self::Vision => "vision",
            Self::Writing => "writing",
            Self::General => "general",
        }
    }

    /// Map a caller-supplied task hint to a kind.
    ///
    /// Unrecognized hints collapse to [`TaskKind::General`], mirroring the
    /// routing table's unknown-kind rule.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_lowercase().as_str() {
            "debug" => Self::Debug,
            "security" => Self::Security,
            "payments" => Self::Payments,
            "database" => Self::Database,
            "vision" => Self::Vision,
            "writing" => Self::Writing,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied hints that steer classification.
#[derive(Debug, Clone, Default)]
pub struct Hints {
    pub need_vision: bool,
    pub strict: bool,
    pub task_hint: Option<String>,
}

/// Structured description of a task, derived purely from the prompt and hints.
/// Immutable once produced; never persisted past the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub kind: TaskKind,
    pub strict: bool,
    pub long: bool,
    pub needs_vision: bool,
}

// Category keyword sets, matched against the lower-cased prompt.
const STACK_KEYWORDS: &[&str] = &[
    "stack",
    "traceback",
    "exception",
    "error",
    "failed",
    "segfault",
    "panic",
    "exit code",
];
const DEPLOY_KEYWORDS: &[&str] = &[
    "deploy",
    "ci/cd",
    "pipeline",
    "railway",
    "netlify",
    "docker",
    "kubernetes",
    "build",
    "release",
];
const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "vulnerability",
    "audit",
    "cve",
    "leak",
    "secret",
    "key",
    "gdpr",
    "pii",
];
const PAYMENT_KEYWORDS: &[&str] = &[
    "stripe",
    "paypal",
    "webhook",
    "payment",
    "checkout",
    "subscription",
];
const DATABASE_KEYWORDS: &[&str] = &[
    "supabase",
    "postgres",
    "sql",
    "rls",
    "policy",
    "migration",
    "schema",
];
const VISION_KEYWORDS: &[&str] = &["image", "screenshot", "png", "jpg", "vision", "ocr"];
const WRITING_KEYWORDS: &[&str] = &[
    "email",
    "reply",
    "translate",
    "rewrite",
    "cv",
    "letter",
    "complaint",
];
const STRICT_KEYWORDS: &[&str] = &[
    "must",
    "mandatory",
    "cannot be skipped",
    "100%",
    "proof",
    "gate",
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Classify a prompt into a [`TaskDescriptor`].
///
/// An explicit `task_hint` overrides keyword detection for the kind;
/// strictness, length, and vision are still computed from the heuristics.
/// Security and payments tasks are always strict, regardless of wording.
///
/// # Errors
/// Returns [`RouterError::InvalidInput`] for an empty or whitespace-only
/// prompt; classification never silently defaults empty input to `general`.
pub fn classify(prompt: &str, hints: &Hints, long_threshold: usize) -> RouterResult<TaskDescriptor> {
    if prompt.trim().is_empty() {
        return Err(RouterError::InvalidInput(
            "prompt is empty or whitespace-only".to_string(),
        ));
    }

    let lower = prompt.to_lowercase();

    let needs_vision = hints.need_vision || contains_any(&lower, VISION_KEYWORDS);
    let long = prompt.chars().count() > long_threshold;

    // Priority order: vision > debug > security > payments > database > writing.
    let kind = if let Some(hint) = hints.task_hint.as_deref() {
        TaskKind::from_hint(hint)
    } else if needs_vision {
        TaskKind::Vision
    } else if contains_any(&lower, STACK_KEYWORDS) || contains_any(&lower, DEPLOY_KEYWORDS) {
        TaskKind::Debug
    } else if contains_any(&lower, SECURITY_KEYWORDS) {
        TaskKind::Security
    } else if contains_any(&lower, PAYMENT_KEYWORDS) {
        TaskKind::Payments
    } else if contains_any(&lower, DATABASE_KEYWORDS) {
        TaskKind::Database
    } else if contains_any(&lower, WRITING_KEYWORDS) {
        TaskKind::Writing
    } else {
        TaskKind::General
    };

    let strict = hints.strict
        || contains_any(&lower, STRICT_KEYWORDS)
        || matches!(kind, TaskKind::Security | TaskKind::Payments);

    Ok(TaskDescriptor {
        kind,
        strict,
        long,
        needs_vision,
    })
}
