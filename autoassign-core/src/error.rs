use std::path::PathBuf;

/// Errors raised while loading or validating an assignment configuration.
///
/// All of these are fatal for a run: the caller reports them and stops
/// before any selection is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Expected '{map}' to be set because '{switch}' = true")]
    MissingGroups {
        switch: &'static str,
        map: &'static str,
    },

    #[error("'{field}' must be a non-negative integer, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("Unrecognized addAssignees directive '{0}' (expected true, false or \"author\")")]
    UnknownAssigneeDirective(String),

    #[error("Invalid UTC offset '{0}' (expected Z, UTC, +HH:MM or -HH:MM)")]
    InvalidUtcOffset(String),

    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration file {} (expected a .json or .toml extension)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("Pull request author must not be empty")]
    EmptyAuthor,
}
