pub mod config;
pub mod eligibility;
pub mod error;
pub mod sampler;

pub use config::*;
pub use eligibility::*;
pub use error::*;
pub use sampler::*;
