//! Pure assignment planning.
//!
//! Runs the gates, derives the exclusion set for today and samples reviewers
//! and assignees. Nothing here performs I/O; the returned effects are
//! executed by the interpreter.

use autoassign_core::{
    compute_exclusions, evaluate_gates, select_for_event, unavailable_on, weekday_name, Config,
    EligibilityError, PullRequestDetails,
};
use chrono::Weekday;
use rand::Rng;

use super::effect::Effect;

pub const NO_REVIEWERS_MESSAGE: &str = "No reviewers available, no reviews requested.";
pub const NO_ASSIGNEES_MESSAGE: &str = "No possible assignees available, no one assigned.";

/// Plan the reviewer and assignee effects for one pull request event.
///
/// A gate hit yields a single informational log and nothing else. An empty
/// selection for an enabled role yields an informational log instead of an
/// API call.
pub fn plan_assignment<R: Rng>(
    pr: &PullRequestDetails,
    config: &Config,
    today: Weekday,
    rng: &mut R,
) -> Result<Vec<Effect>, EligibilityError> {
    if let Some(gate) = evaluate_gates(pr, config) {
        return Ok(vec![Effect::info(gate.to_string())]);
    }

    let availability = config.availability_exceptions.as_ref();
    let exclusions = compute_exclusions(&pr.author, today, availability)?;

    let mut effects = Vec::new();

    if availability.is_some() {
        effects.push(Effect::info(format!(
            "Unavailable users today ({}): {}",
            weekday_name(today),
            unavailable_on(today, availability).join(", ")
        )));
    }

    let selection = select_for_event(&pr.author, config, &exclusions, rng);

    match selection.reviewers {
        Some(reviewers) if !reviewers.is_empty() => {
            effects.push(Effect::RequestReviewers { reviewers })
        }
        Some(_) => effects.push(Effect::info(NO_REVIEWERS_MESSAGE)),
        None => {}
    }

    match selection.assignees {
        Some(assignees) if !assignees.is_empty() => {
            effects.push(Effect::AddAssignees { assignees })
        }
        Some(_) => effects.push(Effect::info(NO_ASSIGNEES_MESSAGE)),
        None => {}
    }

    Ok(effects)
}
