//! Eligibility filter.
//!
//! Decides whether an event should be processed at all (the gates) and who
//! is out of consideration for this event (the exclusion set).

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc, Weekday};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{AvailabilityExceptions, Config, FilterLabels};
use crate::error::{ConfigError, EligibilityError};

/// Logins that must not be selected for the current event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let logins: Vec<&str> = self.iter().collect();
        write!(f, "{}", logins.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// English weekday name as used for `availabilityExceptions` keys.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Weekday of `instant` as seen from a fixed UTC offset.
///
/// UTC ([`utc`]) is the default reference zone.
pub fn weekday_at(instant: DateTime<Utc>, offset: FixedOffset) -> Weekday {
    instant.with_timezone(&offset).weekday()
}

/// The UTC reference offset.
pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
///
/// Numeric forms go through chrono's `%z` parser, so hours and minutes must
/// be exactly two ASCII digits each and nothing may trail the offset.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| ConfigError::InvalidUtcOffset(value.to_string()))
}

/// Compute who is excluded from selection for this event.
///
/// The result always contains `author`, plus everyone listed under
/// today's weekday in `availability_exceptions`. Weekday keys are matched
/// case-insensitively; other weekdays contribute nothing.
pub fn compute_exclusions(
    author: &str,
    today: Weekday,
    availability_exceptions: Option<&AvailabilityExceptions>,
) -> Result<ExclusionSet, EligibilityError> {
    if author.trim().is_empty() {
        return Err(EligibilityError::EmptyAuthor);
    }

    let mut excluded = BTreeSet::from([author.to_string()]);
    excluded.extend(unavailable_on(today, availability_exceptions));

    Ok(ExclusionSet(excluded))
}

/// Logins listed as unavailable on `day`.
pub fn unavailable_on(
    day: Weekday,
    availability_exceptions: Option<&AvailabilityExceptions>,
) -> Vec<String> {
    let name = weekday_name(day);
    availability_exceptions
        .into_iter()
        .flatten()
        .filter(|(weekday, _)| weekday.trim().eq_ignore_ascii_case(name))
        .flat_map(|(_, logins)| logins.iter().cloned())
        .collect()
}

/// True if the title contains any skip keyword, ignoring case.
///
/// An empty keyword is a substring of every title.
pub fn should_skip(title: &str, skip_keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    skip_keywords
        .iter()
        .any(|keyword| title.contains(&keyword.to_lowercase()))
}

/// True (halt processing) iff the PR is a draft and drafts are not handled.
pub fn is_draft_skippable(draft: bool, run_on_draft: bool) -> bool {
    draft && !run_on_draft
}

/// Apply the include/exclude label filter.
///
/// Include is checked first: a non-empty include list requires at least one
/// of its labels. Then a non-empty exclude list requires none of its labels.
pub fn matches_label_filter(pr_labels: &[String], filter_labels: Option<&FilterLabels>) -> bool {
    filter_labels.map_or(true, |filter| {
        !lacks_included_label(pr_labels, filter) && !has_excluded_label(pr_labels, filter)
    })
}

fn has_any_label(pr_labels: &[String], wanted: &[String]) -> bool {
    pr_labels.iter().any(|label| wanted.contains(label))
}

fn lacks_included_label(pr_labels: &[String], filter: &FilterLabels) -> bool {
    !filter.include.is_empty() && !has_any_label(pr_labels, &filter.include)
}

fn has_excluded_label(pr_labels: &[String], filter: &FilterLabels) -> bool {
    !filter.exclude.is_empty() && has_any_label(pr_labels, &filter.exclude)
}

/// The facts about a pull request the gates and sampler look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDetails {
    pub author: String,
    pub title: String,
    pub draft: bool,
    pub labels: Vec<String>,
}

/// An early exit that stops reviewer and assignee processing for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    SkipKeyword,
    Draft,
    MissingIncludedLabel,
    HasExcludedLabel,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Gate::SkipKeyword => "PR title includes skip-keywords",
            Gate::Draft => "PR type is draft",
            Gate::MissingIncludedLabel => "PR is not tagged with any of the filterLabels.include",
            Gate::HasExcludedLabel => "PR is tagged with one of the filterLabels.exclude",
        };
        write!(
            f,
            "Skips the process to add reviewers/assignees since {}",
            reason
        )
    }
}

/// Run the gates in order (keyword, draft, include, exclude) and return the
/// first one that halts processing.
pub fn evaluate_gates(pr: &PullRequestDetails, config: &Config) -> Option<Gate> {
    if should_skip(&pr.title, &config.skip_keywords) {
        return Some(Gate::SkipKeyword);
    }
    if is_draft_skippable(pr.draft, config.run_on_draft) {
        return Some(Gate::Draft);
    }
    if let Some(filter) = &config.filter_labels {
        if lacks_included_label(&pr.labels, filter) {
            return Some(Gate::MissingIncludedLabel);
        }
        if has_excluded_label(&pr.labels, filter) {
            return Some(Gate::HasExcludedLabel);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use chrono::TimeZone;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn exceptions(entries: &[(&str, &[&str])]) -> AvailabilityExceptions {
        entries
            .iter()
            .map(|(day, logins)| (day.to_string(), strings(logins)))
            .collect()
    }

    #[test]
    fn test_exclusions_contain_author_and_todays_unavailable_users() {
        let exceptions = exceptions(&[("Monday", &["B"]), ("Tuesday", &["C"])]);

        let excluded = compute_exclusions("A", Weekday::Mon, Some(&exceptions)).unwrap();

        assert_eq!(excluded, ["A", "B"].into_iter().collect::<ExclusionSet>());
    }

    #[test]
    fn test_unlisted_weekday_contributes_nothing() {
        let exceptions = exceptions(&[("Monday", &["B"])]);

        let excluded = compute_exclusions("A", Weekday::Sun, Some(&exceptions)).unwrap();

        assert_eq!(excluded, ["A"].into_iter().collect::<ExclusionSet>());
    }

    #[test]
    fn test_absent_exceptions_exclude_only_author() {
        let excluded = compute_exclusions("A", Weekday::Wed, None).unwrap();
        assert_eq!(excluded.len(), 1);
        assert!(excluded.contains("A"));
    }

    #[test]
    fn test_weekday_keys_are_case_insensitive() {
        let exceptions = exceptions(&[("friday", &["B"]), ("FRIDAY", &["C"])]);

        let excluded = compute_exclusions("A", Weekday::Fri, Some(&exceptions)).unwrap();

        assert_eq!(excluded, ["A", "B", "C"].into_iter().collect::<ExclusionSet>());
    }

    #[test]
    fn test_empty_author_is_rejected() {
        assert_eq!(
            compute_exclusions("", Weekday::Mon, None),
            Err(EligibilityError::EmptyAuthor)
        );
        assert_eq!(
            compute_exclusions("  ", Weekday::Mon, None),
            Err(EligibilityError::EmptyAuthor)
        );
    }

    #[test]
    fn test_weekday_at_respects_offset() {
        // Monday 23:30 UTC is already Tuesday in UTC+09:00.
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();

        assert_eq!(weekday_at(instant, utc()), Weekday::Mon);
        assert_eq!(
            weekday_at(instant, parse_utc_offset("+09:00").unwrap()),
            Weekday::Tue
        );
        assert_eq!(
            weekday_at(instant, parse_utc_offset("-05:00").unwrap()),
            Weekday::Mon
        );
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap(), utc());
        assert_eq!(parse_utc_offset("utc").unwrap(), utc());
        assert_eq!(
            parse_utc_offset("+05:30").unwrap().local_minus_utc(),
            5 * 3600 + 30 * 60
        );
        assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -8 * 3600);

        for bad in [
            "", "09:00", "+9:00", "+24:00", "+01:60", "+ab:cd", "+0100x", "+-1:00", "++1:00",
            "+00:-1",
        ] {
            assert!(parse_utc_offset(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_should_skip_case_insensitive_substring() {
        let keywords = strings(&["WIP"]);
        assert!(should_skip("WIP: fix bug", &keywords));
        assert!(should_skip("[wip] refactor", &keywords));
        assert!(!should_skip("Fix bug", &keywords));
    }

    #[test]
    fn test_should_skip_with_no_keywords() {
        assert!(!should_skip("WIP: fix bug", &[]));
    }

    #[test]
    fn test_empty_keyword_skips_every_title() {
        assert!(should_skip("anything", &strings(&[""])));
        assert!(should_skip("", &strings(&[""])));
        assert!(!should_skip("Fix bug", &strings(&["  "])));
    }

    #[test]
    fn test_is_draft_skippable() {
        assert!(is_draft_skippable(true, false));
        assert!(!is_draft_skippable(true, true));
        assert!(!is_draft_skippable(false, false));
        assert!(!is_draft_skippable(false, true));
    }

    #[test]
    fn test_label_filter_include_and_exclude() {
        let filter = FilterLabels {
            include: strings(&["ready"]),
            exclude: strings(&["do-not-review"]),
        };

        assert!(matches_label_filter(&strings(&["ready"]), Some(&filter)));
        assert!(!matches_label_filter(&strings(&["bug"]), Some(&filter)));
        assert!(!matches_label_filter(&[], Some(&filter)));
        assert!(!matches_label_filter(
            &strings(&["ready", "do-not-review"]),
            Some(&filter)
        ));
    }

    #[test]
    fn test_label_filter_absent_or_empty_passes() {
        assert!(matches_label_filter(&[], None));
        assert!(matches_label_filter(
            &strings(&["anything"]),
            Some(&FilterLabels::default())
        ));
    }

    fn gate_config(raw: RawConfig) -> Config {
        Config::from_raw(raw).unwrap()
    }

    fn pr(title: &str, draft: bool, labels: &[&str]) -> PullRequestDetails {
        PullRequestDetails {
            author: "A".to_string(),
            title: title.to_string(),
            draft,
            labels: strings(labels),
        }
    }

    #[test]
    fn test_gates_apply_in_order() {
        let config = gate_config(RawConfig {
            skip_keywords: strings(&["wip"]),
            filter_labels: Some(FilterLabels {
                include: strings(&["ready"]),
                exclude: strings(&["blocked"]),
            }),
            ..RawConfig::default()
        });

        assert_eq!(
            evaluate_gates(&pr("WIP: x", true, &[]), &config),
            Some(Gate::SkipKeyword)
        );
        assert_eq!(
            evaluate_gates(&pr("x", true, &[]), &config),
            Some(Gate::Draft)
        );
        assert_eq!(
            evaluate_gates(&pr("x", false, &["blocked"]), &config),
            Some(Gate::MissingIncludedLabel)
        );
        assert_eq!(
            evaluate_gates(&pr("x", false, &["ready", "blocked"]), &config),
            Some(Gate::HasExcludedLabel)
        );
        assert_eq!(evaluate_gates(&pr("x", false, &["ready"]), &config), None);
    }

    #[test]
    fn test_draft_allowed_when_run_on_draft() {
        let config = gate_config(RawConfig {
            run_on_draft: true,
            ..RawConfig::default()
        });
        assert_eq!(evaluate_gates(&pr("x", true, &[]), &config), None);
    }

    #[test]
    fn test_gate_messages() {
        assert_eq!(
            Gate::Draft.to_string(),
            "Skips the process to add reviewers/assignees since PR type is draft"
        );
    }
}
