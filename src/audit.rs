//! Append-only audit trail.
//!
//! One timestamped physical line per event, fire-and-forget. The trail is
//! write-only from the router's perspective: nothing in the pipeline ever
//! reads it back, it exists for the human operator. The sink is injected
//! into each component so tests can capture events in memory.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::classify::TaskDescriptor;
use crate::policy::RouteSpec;

/// One audit-worthy pipeline event.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    Start,
    Task(TaskDescriptor),
    Route {
        primary: RouteSpec,
        verifier: RouteSpec,
    },
    Attempt {
        spec: RouteSpec,
    },
    AttemptFailed {
        spec: RouteSpec,
        message: String,
    },
    Draft {
        spec: RouteSpec,
    },
    VerifierCall {
        spec: RouteSpec,
        attempt: u32,
    },
    FixRound {
        attempt: u32,
    },
    VerifierError {
        attempt: u32,
        message: String,
    },
    Done,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Task(task) => write!(
                f,
                "TASK kind={} strict={} long={} vision={}",
                task.kind, task.strict, task.long, task.needs_vision
            ),
            Self::Route { primary, verifier } => {
                write!(f, "ROUTE primary={primary} verifier={verifier}")
            }
            Self::Attempt { spec } => write!(f, "CALL primary {spec}"),
            Self::AttemptFailed { spec, message } => {
                write!(f, "PRIMARY FAIL {spec} :: {message}")
            }
            Self::Draft { spec } => write!(f, "DRAFT from {spec}"),
            Self::VerifierCall { spec, attempt } => {
                write!(f, "CALL verifier {spec} attempt={attempt}")
            }
            Self::FixRound { attempt } => {
                write!(f, "VERIFIER FAIL -> FIX ROUND attempt={attempt}")
            }
            Self::VerifierError { attempt, message } => {
                write!(f, "VERIFIER ERROR attempt={attempt} :: {message}")
            }
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// Write-only audit trail capability.
pub trait AuditSink: Send + Sync {
    /// Record one event. Must never fail the caller; sinks swallow their own
    /// I/O errors.
    fn record(&self, event: &AuditEvent);
}

/// Audit sink appending timestamped lines to a file.
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        let line = format!("[{}] {}\n", chrono::Utc::now().to_rfc3339(), event);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            tracing::warn!("audit append to {} failed: {}", self.path.display(), e);
        }
    }
}

/// In-memory audit sink for tests and embedding.
#[derive(Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered event lines, in record order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("audit sink lock poisoned").clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.lines
            .lock()
            .expect("audit sink lock poisoned")
            .push(event.to_string());
    }
}
