//! Effect interpreter that executes effects against the GitHub API.
//!
//! Each effect is executed on its own: a failed reviewer request is logged
//! as a warning and does not stop the assignee request, and vice versa.

use std::sync::Arc;

use tracing::{info, warn};

use super::effect::Effect;
use crate::github::{PullRequestApi, PullRequestInfo};

/// Context needed by the interpreter to execute effects.
pub struct InterpreterContext {
    pub api: Arc<dyn PullRequestApi>,
    pub pr: PullRequestInfo,
    /// Correlation ID for request tracing.
    pub correlation_id: Option<String>,
}

/// Result of executing an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectResult {
    /// The GitHub mutation succeeded.
    Applied,
    /// Nothing to call (log effects).
    Logged,
    /// The mutation failed and was downgraded to a warning.
    Failed(String),
}

/// Execute effects sequentially, continuing past failures.
pub async fn execute_effects(ctx: &InterpreterContext, effects: Vec<Effect>) -> Vec<EffectResult> {
    let mut results = Vec::with_capacity(effects.len());
    for effect in effects {
        results.push(execute_effect(ctx, effect).await);
    }
    results
}

async fn execute_effect(ctx: &InterpreterContext, effect: Effect) -> EffectResult {
    let correlation_id = ctx.correlation_id.as_deref();

    match effect {
        Effect::RequestReviewers { reviewers } => {
            match ctx
                .api
                .request_reviewers(correlation_id, &ctx.pr, &reviewers)
                .await
            {
                Ok(()) => {
                    info!(
                        "Added reviewers to PR #{}: {}",
                        ctx.pr.pr_number,
                        reviewers.join(", ")
                    );
                    EffectResult::Applied
                }
                Err(e) => {
                    warn!(
                        "Failed to request reviewers on PR #{}: {:#}",
                        ctx.pr.pr_number, e
                    );
                    EffectResult::Failed(format!("{:#}", e))
                }
            }
        }

        Effect::AddAssignees { assignees } => {
            match ctx
                .api
                .add_assignees(correlation_id, &ctx.pr, &assignees)
                .await
            {
                Ok(()) => {
                    info!(
                        "Added assignees to PR #{}: {}",
                        ctx.pr.pr_number,
                        assignees.join(", ")
                    );
                    EffectResult::Applied
                }
                Err(e) => {
                    warn!(
                        "Failed to add assignees on PR #{}: {:#}",
                        ctx.pr.pr_number, e
                    );
                    EffectResult::Failed(format!("{:#}", e))
                }
            }
        }

        Effect::Log { message } => {
            info!("{}", message);
            EffectResult::Logged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Reviewers(Vec<String>),
        Assignees(Vec<String>),
    }

    #[derive(Default)]
    struct FakeApi {
        fail_reviewers: bool,
        fail_assignees: bool,
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl PullRequestApi for FakeApi {
        async fn request_reviewers(
            &self,
            _correlation_id: Option<&str>,
            _pr: &PullRequestInfo,
            reviewers: &[String],
        ) -> Result<()> {
            self.calls
                .lock()
                .await
                .push(Call::Reviewers(reviewers.to_vec()));
            if self.fail_reviewers {
                return Err(anyhow!("Reviews may only be requested from collaborators"));
            }
            Ok(())
        }

        async fn add_assignees(
            &self,
            _correlation_id: Option<&str>,
            _pr: &PullRequestInfo,
            assignees: &[String],
        ) -> Result<()> {
            self.calls
                .lock()
                .await
                .push(Call::Assignees(assignees.to_vec()));
            if self.fail_assignees {
                return Err(anyhow!("assignee lacks access"));
            }
            Ok(())
        }
    }

    fn context(api: Arc<FakeApi>) -> InterpreterContext {
        InterpreterContext {
            api,
            pr: PullRequestInfo {
                installation_id: 1,
                repo_owner: "owner".to_string(),
                repo_name: "repo".to_string(),
                pr_number: 42,
            },
            correlation_id: Some("delivery-1".to_string()),
        }
    }

    fn effects() -> Vec<Effect> {
        vec![
            Effect::info("Unavailable users today (Monday): "),
            Effect::RequestReviewers {
                reviewers: vec!["bob".to_string()],
            },
            Effect::AddAssignees {
                assignees: vec!["carol".to_string()],
            },
        ]
    }

    #[tokio::test]
    async fn test_all_effects_applied() {
        let api = Arc::new(FakeApi::default());
        let ctx = context(api.clone());

        let results = execute_effects(&ctx, effects()).await;

        assert_eq!(
            results,
            vec![
                EffectResult::Logged,
                EffectResult::Applied,
                EffectResult::Applied
            ]
        );
        assert_eq!(
            *api.calls.lock().await,
            vec![
                Call::Reviewers(vec!["bob".to_string()]),
                Call::Assignees(vec!["carol".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_reviewer_failure_does_not_block_assignees() {
        let api = Arc::new(FakeApi {
            fail_reviewers: true,
            ..FakeApi::default()
        });
        let ctx = context(api.clone());

        let results = execute_effects(&ctx, effects()).await;

        assert!(matches!(&results[1], EffectResult::Failed(msg) if msg.contains("collaborators")));
        assert_eq!(results[2], EffectResult::Applied);
        assert_eq!(api.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_assignee_failure_is_downgraded() {
        let api = Arc::new(FakeApi {
            fail_assignees: true,
            ..FakeApi::default()
        });
        let ctx = context(api.clone());

        let results = execute_effects(&ctx, effects()).await;

        assert_eq!(results[1], EffectResult::Applied);
        assert!(matches!(&results[2], EffectResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_log_only_plan_makes_no_calls() {
        let api = Arc::new(FakeApi::default());
        let ctx = context(api.clone());

        let results = execute_effects(&ctx, vec![Effect::info("skipped")]).await;

        assert_eq!(results, vec![EffectResult::Logged]);
        assert!(api.calls.lock().await.is_empty());
    }
}
