//! Assignment policy configuration.
//!
//! The on-disk shape (`RawConfig`) mirrors the camelCase keys users write in
//! their `auto_assign` file. It is validated once into an immutable `Config`
//! that the eligibility filter and sampler read from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Named groups of user logins. Ordered so that a seeded random source
/// always sees the keys in the same order.
pub type Groups = BTreeMap<String, Vec<String>>;

/// Weekday name (`Monday` .. `Sunday`) to the logins unavailable that day.
pub type AvailabilityExceptions = BTreeMap<String, Vec<String>>;

/// Literal `addAssignees` value that assigns the PR author themself.
pub const SELF_ASSIGN_DIRECTIVE: &str = "author";

/// Which side of the pull request a selection is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Reviewers,
    Assignees,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reviewers => write!(f, "reviewers"),
            Role::Assignees => write!(f, "assignees"),
        }
    }
}

/// How assignees are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddAssignees {
    #[default]
    Disabled,
    /// Sample assignees from the configured pool.
    Enabled,
    /// Assign the PR author and skip sampling entirely.
    SelfAssign,
}

impl AddAssignees {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AddAssignees::Disabled)
    }
}

/// Label gate applied before any selection happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterLabels {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// `addAssignees` accepts either a boolean or a string directive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawAddAssignees {
    Flag(bool),
    Directive(String),
}

impl Default for RawAddAssignees {
    fn default() -> Self {
        RawAddAssignees::Flag(false)
    }
}

/// Configuration exactly as written by the user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    pub add_reviewers: bool,
    pub add_assignees: RawAddAssignees,
    pub reviewers: Vec<String>,
    pub assignees: Vec<String>,
    pub number_of_reviewers: i64,
    /// Falls back to `numberOfReviewers` when omitted.
    pub number_of_assignees: Option<i64>,
    pub use_review_groups: bool,
    pub use_assignee_groups: bool,
    pub review_groups: Option<Groups>,
    pub assignee_groups: Option<Groups>,
    pub availability_exceptions: Option<AvailabilityExceptions>,
    pub skip_keywords: Vec<String>,
    pub filter_labels: Option<FilterLabels>,
    pub run_on_draft: bool,
}

/// Candidate pool for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool<'a> {
    Flat(&'a [String]),
    Groups(&'a Groups),
}

/// Validated, read-only assignment policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub add_reviewers: bool,
    pub add_assignees: AddAssignees,
    pub reviewers: Vec<String>,
    pub assignees: Vec<String>,
    pub number_of_reviewers: usize,
    pub number_of_assignees: usize,
    pub use_review_groups: bool,
    pub use_assignee_groups: bool,
    pub review_groups: Groups,
    pub assignee_groups: Groups,
    pub availability_exceptions: Option<AvailabilityExceptions>,
    pub skip_keywords: Vec<String>,
    pub filter_labels: Option<FilterLabels>,
    pub run_on_draft: bool,
}

impl Config {
    /// Validate a raw configuration.
    ///
    /// Fails when a group switch is on without its group map, when a count
    /// is negative, or when `addAssignees` is an unknown string.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.use_review_groups && raw.review_groups.is_none() {
            return Err(ConfigError::MissingGroups {
                switch: "useReviewGroups",
                map: "reviewGroups",
            });
        }
        if raw.use_assignee_groups && raw.assignee_groups.is_none() {
            return Err(ConfigError::MissingGroups {
                switch: "useAssigneeGroups",
                map: "assigneeGroups",
            });
        }

        let number_of_reviewers = validate_count("numberOfReviewers", raw.number_of_reviewers)?;
        let number_of_assignees = match raw.number_of_assignees {
            Some(value) => validate_count("numberOfAssignees", value)?,
            None => number_of_reviewers,
        };

        let add_assignees = match raw.add_assignees {
            RawAddAssignees::Flag(true) => AddAssignees::Enabled,
            RawAddAssignees::Flag(false) => AddAssignees::Disabled,
            RawAddAssignees::Directive(directive) if directive == SELF_ASSIGN_DIRECTIVE => {
                AddAssignees::SelfAssign
            }
            RawAddAssignees::Directive(directive) => {
                return Err(ConfigError::UnknownAssigneeDirective(directive))
            }
        };

        Ok(Config {
            add_reviewers: raw.add_reviewers,
            add_assignees,
            reviewers: raw.reviewers,
            assignees: raw.assignees,
            number_of_reviewers,
            number_of_assignees,
            use_review_groups: raw.use_review_groups,
            use_assignee_groups: raw.use_assignee_groups,
            review_groups: raw.review_groups.unwrap_or_default(),
            assignee_groups: raw.assignee_groups.unwrap_or_default(),
            availability_exceptions: raw.availability_exceptions,
            skip_keywords: raw.skip_keywords,
            filter_labels: raw.filter_labels,
            run_on_draft: raw.run_on_draft,
        })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        Self::from_raw(raw)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)?;
        Self::from_raw(raw)
    }

    /// Load a configuration file, picking the format from its extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&contents)
    }

    /// Whether the role is switched on at all.
    pub fn is_enabled(&self, role: Role) -> bool {
        match role {
            Role::Reviewers => self.add_reviewers,
            Role::Assignees => self.add_assignees.is_enabled(),
        }
    }

    pub fn requested_count(&self, role: Role) -> usize {
        match role {
            Role::Reviewers => self.number_of_reviewers,
            Role::Assignees => self.number_of_assignees,
        }
    }

    /// The pool candidates for `role` are drawn from.
    ///
    /// In flat mode an empty assignee list falls back to the reviewer list.
    pub fn pool(&self, role: Role) -> Pool<'_> {
        match role {
            Role::Reviewers if self.use_review_groups => Pool::Groups(&self.review_groups),
            Role::Reviewers => Pool::Flat(&self.reviewers),
            Role::Assignees if self.use_assignee_groups => Pool::Groups(&self.assignee_groups),
            Role::Assignees if self.assignees.is_empty() => Pool::Flat(&self.reviewers),
            Role::Assignees => Pool::Flat(&self.assignees),
        }
    }
}

fn validate_count(field: &'static str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| ConfigError::NegativeCount { field, value })
}
