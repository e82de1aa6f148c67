use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{error, info};

/// Header used to propagate the webhook delivery ID to outgoing requests.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    pub installation_id: u64,
    pub repo_owner: String,
    pub repo_name: String,
    pub pr_number: u64,
}

/// The pull request mutations the assignment interpreter needs.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn request_reviewers(
        &self,
        correlation_id: Option<&str>,
        pr: &PullRequestInfo,
        reviewers: &[String],
    ) -> Result<()>;

    async fn add_assignees(
        &self,
        correlation_id: Option<&str>,
        pr: &PullRequestInfo,
        assignees: &[String],
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    app_id: u64,
    private_key: String,
    token_cache: Arc<RwLock<HashMap<u64, (String, SystemTime)>>>,
}

#[derive(Debug, Serialize)]
struct RequestReviewersRequest<'a> {
    reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
struct AddAssigneesRequest<'a> {
    assignees: &'a [String],
}

#[derive(Debug, Serialize)]
struct GitHubAppClaims {
    iss: u64,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: String,
}

impl GitHubClient {
    pub fn new(app_id: u64, private_key: String) -> Result<Self> {
        Self::with_base_url(app_id, private_key, GITHUB_API_URL)
    }

    pub fn with_base_url(app_id: u64, private_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("autoassign/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            private_key,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn generate_jwt(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("Failed to get current time")?
            .as_secs();

        let claims = GitHubAppClaims {
            iss: self.app_id,
            iat: now - 60,  // Issued 60 seconds ago to account for clock skew
            exp: now + 600, // Expires in 10 minutes
        };

        let header = Header::new(Algorithm::RS256);
        let encoding_key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("Failed to parse private key")?;

        encode(&header, &claims, &encoding_key).context("Failed to encode JWT")
    }

    async fn get_installation_token(&self, installation_id: u64) -> Result<String> {
        // Reuse the cached token unless it expires within five minutes
        {
            let cache = self.token_cache.read().await;
            if let Some((token, expires_at)) = cache.get(&installation_id) {
                if expires_at
                    .duration_since(SystemTime::now())
                    .unwrap_or_default()
                    .as_secs()
                    > 300
                {
                    return Ok(token.clone());
                }
            }
        }

        let jwt = self.generate_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_url, installation_id
        );

        info!("Requesting new installation access token");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", jwt))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("Failed to send installation token request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!(
                "GitHub App token request failed: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub App token request failed: {} - {}",
                status,
                error_text
            ));
        }

        let token_response: InstallationTokenResponse = response
            .json()
            .await
            .context("Failed to parse installation token response")?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&token_response.expires_at)
            .context("Failed to parse token expiration")?
            .with_timezone(&Utc);

        let expires_at_system = UNIX_EPOCH
            + std::time::Duration::from_secs(u64::try_from(expires_at.timestamp()).unwrap_or(0));

        {
            let mut cache = self.token_cache.write().await;
            cache.insert(
                installation_id,
                (token_response.token.clone(), expires_at_system),
            );
        }

        info!("Successfully obtained installation access token");
        Ok(token_response.token)
    }

    /// POST a JSON body to a repository endpoint, failing on non-2xx.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        correlation_id: Option<&str>,
        installation_id: u64,
        url: &str,
        body: &T,
        what: &str,
    ) -> Result<()> {
        let token = self.get_installation_token(installation_id).await?;

        let mut request_builder = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .json(body);

        if let Some(cid) = correlation_id {
            request_builder = request_builder.header(CORRELATION_ID_HEADER, cid);
        }

        let response = request_builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!("GitHub API error ({}): {} - {}", what, status, error_text);
            return Err(anyhow!(
                "GitHub API error ({}): {} - {}",
                what,
                status,
                error_text
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn request_reviewers(
        &self,
        correlation_id: Option<&str>,
        pr: &PullRequestInfo,
        reviewers: &[String],
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/requested_reviewers",
            self.base_url, pr.repo_owner, pr.repo_name, pr.pr_number
        );

        info!(
            "Requesting reviews on PR #{} in {}/{} from {}",
            pr.pr_number,
            pr.repo_owner,
            pr.repo_name,
            reviewers.join(", ")
        );

        self.post_json(
            correlation_id,
            pr.installation_id,
            &url,
            &RequestReviewersRequest { reviewers },
            "request reviewers",
        )
        .await
    }

    async fn add_assignees(
        &self,
        correlation_id: Option<&str>,
        pr: &PullRequestInfo,
        assignees: &[String],
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/assignees",
            self.base_url, pr.repo_owner, pr.repo_name, pr.pr_number
        );

        info!(
            "Assigning PR #{} in {}/{} to {}",
            pr.pr_number,
            pr.repo_owner,
            pr.repo_name,
            assignees.join(", ")
        );

        self.post_json(
            correlation_id,
            pr.installation_id,
            &url,
            &AddAssigneesRequest { assignees },
            "add assignees",
        )
        .await
    }
}
