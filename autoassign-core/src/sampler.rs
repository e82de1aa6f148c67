//! Candidate sampler.
//!
//! Turns a role's pool and the event's exclusion set into a bounded,
//! duplicate-free selection. Flat pools sample across the whole list; group
//! pools pick exactly one group at random and sample inside it only, never
//! topping up from another group.

use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::{AddAssignees, Config, Pool, Role};
use crate::eligibility::ExclusionSet;

/// Reviewers and assignees chosen for one event. `None` means the role is
/// switched off in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub reviewers: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
}

/// Pick `count` distinct items uniformly at random without replacement.
///
/// Runs a partial Fisher-Yates shuffle over an index array. When `count`
/// covers every item, all items come back in their original order and the
/// random source is not touched.
pub fn sample_without_replacement<T: Clone, R: Rng>(
    items: &[T],
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    if count >= items.len() {
        return items.to_vec();
    }

    let mut indices: Vec<usize> = (0..items.len()).collect();
    for i in 0..count {
        let j = rng.random_range(i..indices.len());
        indices.swap(i, j);
    }

    indices[..count].iter().map(|&i| items[i].clone()).collect()
}

/// Pool members that may be selected, in pool order, each login once.
fn eligible_candidates(pool: &[String], author: &str, exclusions: &ExclusionSet) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for login in pool {
        if login == author || exclusions.contains(login) {
            continue;
        }
        if seen.insert(login.as_str()) {
            candidates.push(login.clone());
        }
    }
    candidates
}

/// Select candidates for `role` without looking at whether the role is
/// enabled or in self-assign mode.
pub fn select_candidates<R: Rng>(
    role: Role,
    author: &str,
    config: &Config,
    exclusions: &ExclusionSet,
    rng: &mut R,
) -> Vec<String> {
    let requested = config.requested_count(role);

    match config.pool(role) {
        Pool::Flat(pool) => {
            let candidates = eligible_candidates(pool, author, exclusions);
            sample_without_replacement(&candidates, requested, rng)
        }
        Pool::Groups(groups) => {
            if groups.is_empty() {
                return Vec::new();
            }
            let names: Vec<&String> = groups.keys().collect();
            let chosen = names[rng.random_range(0..names.len())];
            let candidates = eligible_candidates(&groups[chosen], author, exclusions);
            sample_without_replacement(&candidates, requested, rng)
        }
    }
}

pub fn select_reviewers<R: Rng>(
    author: &str,
    config: &Config,
    exclusions: &ExclusionSet,
    rng: &mut R,
) -> Vec<String> {
    select_candidates(Role::Reviewers, author, config, exclusions, rng)
}

/// Like [`select_reviewers`], except that the self-assign directive
/// short-circuits to `[author]`.
pub fn select_assignees<R: Rng>(
    author: &str,
    config: &Config,
    exclusions: &ExclusionSet,
    rng: &mut R,
) -> Vec<String> {
    if config.add_assignees == AddAssignees::SelfAssign {
        return vec![author.to_string()];
    }
    select_candidates(Role::Assignees, author, config, exclusions, rng)
}

/// Run both roles as enabled by `addReviewers` / `addAssignees`.
pub fn select_for_event<R: Rng>(
    author: &str,
    config: &Config,
    exclusions: &ExclusionSet,
    rng: &mut R,
) -> Selection {
    let reviewers = config
        .add_reviewers
        .then(|| select_reviewers(author, config, exclusions, rng));
    let assignees = config
        .add_assignees
        .is_enabled()
        .then(|| select_assignees(author, config, exclusions, rng));

    Selection {
        reviewers,
        assignees,
    }
}
