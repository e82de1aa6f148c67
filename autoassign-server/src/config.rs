use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;

use autoassign_core::parse_utc_offset;

#[derive(Clone)]
pub struct ServerConfig {
    pub github_app_id: u64,
    pub github_private_key: String,
    pub github_webhook_secret: String,
    /// Base URL of the GitHub REST API (override for GitHub Enterprise).
    pub github_api_url: String,
    pub port: u16,
    /// Path to the JSON or TOML assignment policy file.
    pub assign_config_path: PathBuf,
    /// Reference zone for deciding which weekday it is.
    pub availability_utc_offset: FixedOffset,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let github_app_id = env::var("GITHUB_APP_ID")
            .context("GITHUB_APP_ID environment variable is required")?
            .parse::<u64>()
            .context("GITHUB_APP_ID must be a valid number")?;

        let github_private_key = env::var("GITHUB_PRIVATE_KEY")
            .context("GITHUB_PRIVATE_KEY environment variable is required")?
            .replace("\\n", "\n");

        let github_webhook_secret = env::var("GITHUB_WEBHOOK_SECRET")
            .context("GITHUB_WEBHOOK_SECRET environment variable is required")?;

        let github_api_url = env::var("GITHUB_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "https://api.github.com".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let assign_config_path = env::var("AUTOASSIGN_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("auto_assign.toml"));

        let availability_utc_offset =
            parse_offset_setting(env::var("AVAILABILITY_UTC_OFFSET").ok())?;

        Ok(ServerConfig {
            github_app_id,
            github_private_key,
            github_webhook_secret,
            github_api_url,
            port,
            assign_config_path,
            availability_utc_offset,
        })
    }
}

/// Parse AVAILABILITY_UTC_OFFSET, defaulting to UTC when unset or blank.
pub fn parse_offset_setting(value: Option<String>) -> Result<FixedOffset> {
    match value.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_utc_offset(&raw).context("AVAILABILITY_UTC_OFFSET is invalid"),
        None => Ok(autoassign_core::utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_setting_defaults_to_utc() {
        assert_eq!(parse_offset_setting(None).unwrap().local_minus_utc(), 0);
        assert_eq!(
            parse_offset_setting(Some("   ".to_string()))
                .unwrap()
                .local_minus_utc(),
            0
        );
    }

    #[test]
    fn test_offset_setting_parses_value() {
        assert_eq!(
            parse_offset_setting(Some("+09:00".to_string()))
                .unwrap()
                .local_minus_utc(),
            9 * 3600
        );
    }

    #[test]
    fn test_offset_setting_rejects_garbage() {
        let err = parse_offset_setting(Some("tomorrow".to_string())).unwrap_err();
        assert!(err.to_string().contains("AVAILABILITY_UTC_OFFSET"));
    }
}
