//! Application wiring

pub mod options;
pub mod orchestrator;
pub mod run;

pub use orchestrator::Orchestrator;
