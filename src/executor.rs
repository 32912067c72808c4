//! Fallback executor.
//!
//! Sequential race to first success: each entry in the chain is attempted
//! under its own timeout before the next begins, so one vendor's outage never
//! stalls the chain and at most one call is in flight per request. Worst-case
//! latency is the sum of all attempted timeouts.

use crate::audit::{AuditEvent, AuditSink};
use crate::error::{RouterError, RouterResult};
use crate::policy::RouteSpec;
use crate::providers::ProviderClient;

/// Result of a successful fallback execution. `used_spec` records which chain
/// entry actually produced the draft, which may differ from the routed
/// primary.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub draft_text: String,
    pub used_spec: RouteSpec,
}

/// Try each spec in `chain` in order, returning the first non-empty answer.
///
/// Entries identical to an already-attempted spec are skipped, so a routed
/// primary that also appears in the fallback list is tried once, not twice.
/// Every failed attempt is recorded to the audit sink before advancing.
///
/// # Errors
/// [`RouterError::AllProvidersFailed`] when every attempted entry failed.
pub async fn execute_with_fallback(
    client: &dyn ProviderClient,
    audit: &dyn AuditSink,
    chain: &[RouteSpec],
    system: &str,
    user: &str,
) -> RouterResult<ExecutionOutcome> {
    let mut attempted: Vec<&RouteSpec> = Vec::with_capacity(chain.len());

    for spec in chain {
        if attempted.contains(&spec) {
            tracing::debug!("skipping duplicate chain entry {spec}");
            continue;
        }
        attempted.push(spec);

        audit.record(&AuditEvent::Attempt { spec: spec.clone() });
        match client.call(spec, system, user).await {
            Ok(result) => {
                let draft = result.text.trim();
                if draft.is_empty() {
                    // Adapters reject empty text, but a whitespace-only answer
                    // still counts as hollow.
                    audit.record(&AuditEvent::AttemptFailed {
                        spec: spec.clone(),
                        message: "empty response text".to_string(),
                    });
                    continue;
                }
                audit.record(&AuditEvent::Draft { spec: spec.clone() });
                tracing::info!("draft served by {spec}");
                return Ok(ExecutionOutcome {
                    draft_text: draft.to_string(),
                    used_spec: spec.clone(),
                });
            }
            Err(e) => {
                tracing::warn!("provider attempt {spec} failed: {e}");
                audit.record(&AuditEvent::AttemptFailed {
                    spec: spec.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    Err(RouterError::AllProvidersFailed {
        attempts: attempted.len(),
    })
}
