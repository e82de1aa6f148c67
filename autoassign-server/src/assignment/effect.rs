//! Effects (side effects as data).

/// All effects a plan can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Request reviews from these logins.
    RequestReviewers { reviewers: Vec<String> },

    /// Add these logins as assignees.
    AddAssignees { assignees: Vec<String> },

    /// Informational log line (gate skips, unavailable users, empty selections).
    Log { message: String },
}

impl Effect {
    pub fn info(message: impl Into<String>) -> Self {
        Effect::Log {
            message: message.into(),
        }
    }

    /// Returns true if executing this effect calls the GitHub API.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Effect::RequestReviewers { .. } | Effect::AddAssignees { .. }
        )
    }
}
