//! Pipeline orchestration and the request/response boundary.
//!
//! The router owns the full chain for one stateless invocation:
//! classify → route → fallback execute → optional verify/fix. All provider
//! traffic goes through one injected [`ProviderClient`] and every decision is
//! recorded to the injected [`AuditSink`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audit::{AuditEvent, AuditSink, FileAuditSink};
use crate::classify::{classify, Hints, TaskDescriptor};
use crate::config::RouterConfig;
use crate::error::RouterResult;
use crate::executor::execute_with_fallback;
use crate::policy::RouteSpec;
use crate::providers::{HttpProviderClient, ProviderClient};
use crate::verify::verify_and_fix;

/// System instruction for the primary model.
pub const SYSTEM_PRIMARY: &str = "\
You are a production-grade engineer.
Rules:
- Do not claim you ran tests unless you show commands/logs or the user provided logs.
- If anything is uncertain, say what you would verify and how.
- Prefer step-by-step + exact file paths/commands.
- If user asked \"single file\", provide a single file.
";

/// Optional request metadata steering classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default)]
    pub need_vision: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_hint: Option<String>,
}

/// Input boundary: one prompt plus optional metadata. A missing prompt
/// deserializes as empty and is rejected as `InvalidInput` by the router,
/// not at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub meta: RequestMeta,
}

/// Routing metadata echoed back with the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub task: TaskDescriptor,
    /// The spec that actually served the draft; may differ from the routed
    /// primary when a fallback fired.
    pub primary_used: RouteSpec,
    pub verifier_used: Option<RouteSpec>,
}

/// Output boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterResponse {
    pub meta: ResponseMeta,
    pub answer: String,
    pub verifier_report: Option<String>,
}

/// The model router. Stateless across requests: every invocation classifies,
/// routes, and executes from scratch.
pub struct Router {
    client: Arc<dyn ProviderClient>,
    audit: Arc<dyn AuditSink>,
    config: RouterConfig,
}

impl Router {
    /// Build a router with the real HTTP client and file audit sink.
    pub fn new(config: RouterConfig) -> Self {
        let client = Arc::new(HttpProviderClient::new(config.timeout()));
        let audit = Arc::new(FileAuditSink::new(&config.audit_log_path));
        Self::with_parts(config, client, audit)
    }

    /// Build a router with injected collaborators.
    pub fn with_parts(
        config: RouterConfig,
        client: Arc<dyn ProviderClient>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            client,
            audit,
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run one request through the pipeline.
    ///
    /// Verification runs when `force_verify` is set or the request metadata
    /// marks the task strict.
    ///
    /// # Errors
    /// [`crate::RouterError::InvalidInput`] for an empty prompt, before any
    /// network activity; [`crate::RouterError::AllProvidersFailed`] when the
    /// whole fallback chain is exhausted. Nothing else propagates.
    pub async fn run(
        &self,
        request: &RouterRequest,
        force_verify: bool,
    ) -> RouterResult<RouterResponse> {
        let hints = Hints {
            need_vision: request.meta.need_vision,
            strict: request.meta.strict,
            task_hint: request.meta.task_hint.clone(),
        };
        let task = classify(&request.prompt, &hints, self.config.long_prompt_threshold)?;

        self.audit.record(&AuditEvent::Start);
        self.audit.record(&AuditEvent::Task(task));
        tracing::info!(
            "classified task kind={} strict={} long={} vision={}",
            task.kind,
            task.strict,
            task.long,
            task.needs_vision
        );

        let plan = self.config.routes.route(&task);
        self.audit.record(&AuditEvent::Route {
            primary: plan.primary.clone(),
            verifier: plan.verifier.clone(),
        });
        tracing::info!("routed primary={} verifier={}", plan.primary, plan.verifier);

        let mut chain = Vec::with_capacity(1 + self.config.fallbacks.len());
        chain.push(plan.primary.clone());
        chain.extend(self.config.fallbacks.iter().cloned());

        let outcome = execute_with_fallback(
            &*self.client,
            &*self.audit,
            &chain,
            SYSTEM_PRIMARY,
            &request.prompt,
        )
        .await?;

        let run_verifier = force_verify || request.meta.strict;
        let (answer, verifier_report) = if run_verifier {
            let verification = verify_and_fix(
                &*self.client,
                &*self.audit,
                &request.prompt,
                outcome.draft_text,
                &plan.verifier,
                &outcome.used_spec,
                self.config.max_fix_rounds,
            )
            .await;
            tracing::info!("verification finished: {:?}", verification.verdict);
            (verification.final_text, verification.report)
        } else {
            (outcome.draft_text, None)
        };

        self.audit.record(&AuditEvent::Done);

        Ok(RouterResponse {
            meta: ResponseMeta {
                task,
                primary_used: outcome.used_spec,
                verifier_used: run_verifier.then(|| plan.verifier),
            },
            answer,
            verifier_report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::classify::TaskKind;
    use crate::error::RouterError;
    use crate::policy::Provider;
    use crate::providers::testing::ScriptedClient;

    fn router_with(script: Vec<Result<String, crate::ProviderError>>) -> (Router, Arc<ScriptedClient>, Arc<MemoryAuditSink>) {
        let client = Arc::new(ScriptedClient::new(script));
        let audit = Arc::new(MemoryAuditSink::new());
        let router = Router::with_parts(
            RouterConfig::default(),
            client.clone() as Arc<dyn crate::providers::ProviderClient>,
            audit.clone() as Arc<dyn crate::audit::AuditSink>,
        );
        (router, client, audit)
    }

    fn request(prompt: &str) -> RouterRequest {
        RouterRequest {
            prompt: prompt.to_string(),
            meta: RequestMeta::default(),
        }
    }

    #[tokio::test]
    async fn empty_prompt_rejected_before_any_call() {
        let (router, client, audit) = router_with(vec![]);

        let err = router.run(&request("   "), false).await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidInput(_)));
        assert!(client.calls().is_empty());
        assert!(audit.lines().is_empty());
    }

    #[tokio::test]
    async fn unverified_run_returns_the_draft() {
        let (router, client, audit) = router_with(vec![Ok("draft answer".to_string())]);

        let response = router
            .run(&request("what is the capital of peru"), false)
            .await
            .unwrap();

        assert_eq!(response.answer, "draft answer");
        assert_eq!(response.meta.task.kind, TaskKind::General);
        assert!(response.meta.verifier_used.is_none());
        assert!(response.verifier_report.is_none());
        assert_eq!(client.calls().len(), 1);
        assert!(audit.lines().iter().any(|l| l.starts_with("ROUTE ")));
        assert_eq!(audit.lines().last().map(String::as_str), Some("DONE"));
    }

    #[tokio::test]
    async fn strict_meta_triggers_verification() {
        let (router, client, _audit) = router_with(vec![
            Ok("draft answer".to_string()), // primary
            Ok("PASS".to_string()),         // verifier
        ]);

        let req = RouterRequest {
            prompt: "summarize the ticket".to_string(),
            meta: RequestMeta {
                strict: true,
                ..RequestMeta::default()
            },
        };
        let response = router.run(&req, false).await.unwrap();

        assert_eq!(response.answer, "draft answer");
        assert_eq!(response.verifier_report.as_deref(), Some("PASS"));
        assert!(response.meta.verifier_used.is_some());
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn fallback_spec_is_reported_as_primary_used() {
        let (router, _client, _audit) = router_with(vec![
            Err(crate::ProviderError::Http {
                provider: Provider::Anthropic,
                status: 529,
                body: "overloaded".to_string(),
            }),
            Ok("served by fallback".to_string()),
        ]);

        let response = router
            .run(&request("what is the capital of peru"), false)
            .await
            .unwrap();

        // The routed primary failed, so the first fallback served the draft.
        assert_eq!(
            response.meta.primary_used,
            RouteSpec::new(Provider::Anthropic, "claude-sonnet-4.5-thinking")
        );
        assert_eq!(response.answer, "served by fallback");
    }

    #[tokio::test]
    async fn task_hint_steers_routing() {
        let (router, client, _audit) = router_with(vec![Ok("image description".to_string())]);

        let req = RouterRequest {
            prompt: "please handle this one".to_string(),
            meta: RequestMeta {
                task_hint: Some("vision".to_string()),
                ..RequestMeta::default()
            },
        };
        let response = router.run(&req, false).await.unwrap();

        assert_eq!(response.meta.task.kind, TaskKind::Vision);
        assert_eq!(client.calls()[0].provider, Provider::Google);
    }

    #[test]
    fn boundary_json_shapes() {
        let req: RouterRequest = serde_json::from_str(
            r#"{ "prompt": "check this", "meta": { "strict": true, "task_hint": "debug" } }"#,
        )
        .unwrap();
        assert!(req.meta.strict);
        assert_eq!(req.meta.task_hint.as_deref(), Some("debug"));

        // meta is optional on the wire.
        let bare: RouterRequest = serde_json::from_str(r#"{ "prompt": "check this" }"#).unwrap();
        assert!(!bare.meta.strict);
    }
}
