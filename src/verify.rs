//! Verification loop.
//!
//! A second, stricter model critiques the draft; on a FAIL verdict the primary
//! is asked to correct itself using the verifier's report, bounded by a fix
//! ceiling. Verification is advisory, never gating: any verifier failure
//! degrades to "ship the last good draft" rather than blocking delivery.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::audit::{AuditEvent, AuditSink};
use crate::policy::RouteSpec;
use crate::providers::ProviderClient;

/// Pause between fix rounds, to avoid hammering a provider that just answered.
const FIX_ROUND_PAUSE: Duration = Duration::from_millis(250);

/// System instruction for the verifier model.
pub const SYSTEM_VERIFIER: &str = "\
You are a strict reviewer (\"Truth Guard\").
Task:
- Find missing steps, risky assumptions, contradictions, security issues, or unclear instructions.
- If the answer lacks proof, demand specific proof artifacts.
- Output MUST be: (1) PASS or FAIL, (2) bullet list of issues, (3) concrete fix instructions.
Be concise and brutal.
";

/// Verdict parsed from a free-text verifier report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Terminal status of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The verifier accepted the draft (or its output was ambiguous).
    Pass,
    /// Fix rounds were exhausted with the verifier still objecting.
    Fail,
    /// A verifier or fix call failed; the run is unverified.
    Error,
}

/// Final product of the loop. `final_text` starts as the draft and is
/// replaced each time a fix round produces a new one.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub verdict: VerificationStatus,
    pub report: Option<String>,
    pub final_text: String,
}

fn fail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bFAIL\b").expect("static regex"))
}

fn pass_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bPASS\b").expect("static regex"))
}

/// Parse a free-text verifier report into a verdict.
///
/// Fails only when the report contains the token `FAIL` and not also `PASS`.
/// Ambiguous or mixed output reads as a pass: the loop must terminate on
/// unparseable verifier output rather than spin on it.
pub fn parse_verdict(report: &str) -> Verdict {
    if fail_re().is_match(report) && !pass_re().is_match(report) {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

/// Build the correction prompt for a fix round: the original task, the
/// rejected draft, and the verifier's full report.
fn build_fix_prompt(original_prompt: &str, draft: &str, report: &str) -> String {
    format!(
        "User request:\n{original_prompt}\n\n\
         Your previous draft:\n{draft}\n\n\
         Verifier report (must address ALL):\n{report}\n\n\
         Now produce a corrected final answer.\n\
         Rules:\n\
         - Keep it practical.\n\
         - If code is requested, ensure it runs.\n\
         - If you cannot verify something, give exact verification steps.\n"
    )
}

/// Run the bounded verify-and-fix loop over `draft`.
///
/// Per attempt in `0..=max_attempts`: verify the current draft; stop on any
/// non-FAIL verdict; otherwise ask `primary_spec` (the spec that produced the
/// draft) to correct it with the report and verify again. Terminal conditions:
/// verdict is not FAIL, attempts are exhausted, or a verifier/fix call fails.
pub async fn verify_and_fix(
    client: &dyn ProviderClient,
    audit: &dyn AuditSink,
    original_prompt: &str,
    draft: String,
    verifier_spec: &RouteSpec,
    primary_spec: &RouteSpec,
    max_attempts: u32,
) -> VerificationOutcome {
    let mut final_text = draft;
    let mut report: Option<String> = None;

    for attempt in 0..=max_attempts {
        audit.record(&AuditEvent::VerifierCall {
            spec: verifier_spec.clone(),
            attempt,
        });

        let review = match client
            .call(
                verifier_spec,
                SYSTEM_VERIFIER,
                &format!("Verify this answer:\n\n{final_text}"),
            )
            .await
        {
            Ok(r) => r.text.trim().to_string(),
            Err(e) => {
                tracing::warn!("verifier call failed on attempt {attempt}: {e}");
                audit.record(&AuditEvent::VerifierError {
                    attempt,
                    message: e.to_string(),
                });
                return VerificationOutcome {
                    verdict: VerificationStatus::Error,
                    report,
                    final_text,
                };
            }
        };
        report = Some(review.clone());

        if parse_verdict(&review) == Verdict::Pass {
            return VerificationOutcome {
                verdict: VerificationStatus::Pass,
                report,
                final_text,
            };
        }

        if attempt == max_attempts {
            // Out of fix rounds with the verifier still objecting.
            break;
        }

        audit.record(&AuditEvent::FixRound { attempt });
        tracing::info!("verifier rejected draft, fix round {attempt} via {primary_spec}");

        let fix_prompt = build_fix_prompt(original_prompt, &final_text, &review);
        match client.call(primary_spec, crate::router::SYSTEM_PRIMARY, &fix_prompt).await {
            Ok(fixed) => {
                let text = fixed.text.trim().to_string();
                if !text.is_empty() {
                    final_text = text;
                }
            }
            Err(e) => {
                tracing::warn!("fix round {attempt} failed: {e}");
                audit.record(&AuditEvent::VerifierError {
                    attempt,
                    message: format!("fix round failed: {e}"),
                });
                return VerificationOutcome {
                    verdict: VerificationStatus::Error,
                    report,
                    final_text,
                };
            }
        }

        tokio::time::sleep(FIX_ROUND_PAUSE).await;
    }

    VerificationOutcome {
        verdict: VerificationStatus::Fail,
        report,
        final_text,
    }
}
