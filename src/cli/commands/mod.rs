//! CLI command implementations

pub mod completions;
pub mod config;
pub mod plan;
pub mod run;

pub use completions::execute as completions;
pub use config::execute as config;
pub use plan::execute as plan;
pub use run::execute as run;
