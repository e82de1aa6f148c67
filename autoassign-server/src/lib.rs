pub mod assignment;
pub mod config;
pub mod github;
pub mod webhook;

use std::sync::Arc;

use autoassign_core::Config;
use chrono::FixedOffset;

pub use github::*;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub fn get_bot_version() -> String {
    // A git hash injected at build time wins over the one `built` reads from .git
    let git_hash = option_env!("AUTOASSIGN_GIT_HASH").or(built_info::GIT_COMMIT_HASH);
    match git_hash {
        Some(hash) if hash.len() >= 8 => hash[..8].to_string(),
        Some(hash) => hash.to_string(),
        None => built_info::PKG_VERSION.to_string(),
    }
}

pub struct AppState {
    pub pull_request_api: Arc<dyn PullRequestApi>,
    pub assign_config: Arc<Config>,
    pub webhook_secret: String,
    pub availability_utc_offset: FixedOffset,
}
