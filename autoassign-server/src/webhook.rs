use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use autoassign_core::{weekday_at, PullRequestDetails};

use crate::assignment::{execute_effects, plan_assignment, EffectResult, InterpreterContext};
use crate::github::PullRequestInfo;
use crate::AppState;

/// Delivery ID GitHub attaches to every webhook.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Pull request actions that trigger reviewer and assignee selection.
pub const TRIGGER_ACTIONS: &[&str] = &["opened", "reopened", "ready_for_review"];

/// Correlation ID carried through request extensions to outgoing API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

#[derive(Debug, Deserialize)]
pub struct GitHubWebhookPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
    pub installation: Option<Installation>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Installation {
    pub id: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub draft: bool,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn details(&self) -> PullRequestDetails {
        PullRequestDetails {
            author: self.user.login.clone(),
            title: self.title.clone(),
            draft: self.draft,
            labels: self.labels.iter().map(|l| l.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct User {
    pub id: u64,
    pub login: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
}

impl WebhookResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(WebhookResponse {
            message: message.into(),
        })
    }
}

type HmacSha256 = Hmac<Sha256>;

fn verify_github_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    // Decode the hex signature to bytes
    let signature_bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(payload);

    // Use constant-time verification
    mac.verify_slice(&signature_bytes).is_ok()
}

fn correlation_id_from_headers(headers: &HeaderMap) -> CorrelationId {
    let delivery = headers
        .get(DELIVERY_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty());

    match delivery {
        Some(id) => CorrelationId(id.to_string()),
        None => CorrelationId(Uuid::new_v4().to_string()),
    }
}

async fn verify_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let signature = parts
        .headers
        .get("x-hub-signature-256")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_github_signature(&state.webhook_secret, &bytes, signature) {
        error!("Invalid webhook signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let correlation_id = correlation_id_from_headers(&parts.headers);

    // Add correlation_id to request extensions for use in handlers and HTTP clients
    let mut new_request = Request::from_parts(parts, axum::body::Body::from(bytes));
    new_request.extensions_mut().insert(correlation_id);

    Ok(next.run(new_request).await)
}

pub fn is_trigger_action(action: &str) -> bool {
    TRIGGER_ACTIONS.contains(&action)
}

pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<WebhookResponse>, StatusCode> {
    info!("Received webhook payload");

    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone());

    let (_parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let payload: GitHubWebhookPayload =
        serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;

    let action = payload.action.as_deref().unwrap_or_default();
    if !is_trigger_action(action) {
        info!("Ignoring webhook action: {:?}", payload.action);
        return Ok(WebhookResponse::new("Event ignored"));
    }

    let Some(pr) = &payload.pull_request else {
        warn!("No pull request information in payload");
        return Ok(WebhookResponse::new("Event ignored"));
    };
    let Some(repo) = &payload.repository else {
        warn!("No repository information in payload, skipping assignment");
        return Ok(WebhookResponse::new("Event ignored"));
    };
    let Some(installation) = &payload.installation else {
        warn!("No installation information in payload, skipping assignment");
        return Ok(WebhookResponse::new("Event ignored"));
    };

    info!(
        "Processing PR #{} in {} ({}), opened by {}",
        pr.number, repo.full_name, action, pr.user.login
    );

    let details = pr.details();
    let today = weekday_at(Utc::now(), state.availability_utc_offset);

    // ThreadRng is not Send, so it must be dropped before the next await.
    let planned = {
        let mut rng = rand::rng();
        plan_assignment(&details, &state.assign_config, today, &mut rng)
    };

    let effects = match planned {
        Ok(effects) => effects,
        Err(e) => {
            error!("Failed to plan assignment for PR #{}: {}", pr.number, e);
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let span = info_span!(
        "assignment",
        correlation_id = correlation_id.as_deref().unwrap_or("-"),
        pr = pr.number
    );

    let ctx = InterpreterContext {
        api: state.pull_request_api.clone(),
        pr: PullRequestInfo {
            installation_id: installation.id,
            repo_owner: repo.owner.login.clone(),
            repo_name: repo.name.clone(),
            pr_number: pr.number,
        },
        correlation_id,
    };

    let results = execute_effects(&ctx, effects).instrument(span).await;
    let applied = results
        .iter()
        .filter(|r| matches!(r, EffectResult::Applied))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, EffectResult::Failed(_)))
        .count();

    info!(
        "Assignment finished for PR #{}: {} applied, {} failed",
        pr.number, applied, failed
    );

    Ok(WebhookResponse::new(format!(
        "Assignment processed: {} applied, {} failed",
        applied, failed
    )))
}

pub fn webhook_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(github_webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_webhook_signature,
        ))
}
