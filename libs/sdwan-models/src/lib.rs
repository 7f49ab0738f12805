//! Wire models shared by the phase orchestrator and anything that consumes
//! its output (state machines, dashboards, the report reader).

pub mod models;

pub use models::*;
