//! Reviewer and assignee assignment for a single pull request event.
//!
//! The design mirrors a small functional core:
//! - **Plan**: pure function `(PR, Config, weekday, rng) -> Vec<Effect>`
//! - **Effects**: what to do, as data (`Effect`)
//! - **Interpreter**: executes effects against the GitHub API
//!
//! Keeping the plan pure means every policy decision can be tested without
//! mocking HTTP.

pub mod effect;
pub mod interpreter;
pub mod plan;

pub use effect::*;
pub use interpreter::*;
pub use plan::*;
