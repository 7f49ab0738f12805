//! SD-WAN Orchestrator Library
//!
//! Compiles a declarative router topology into per-phase configuration
//! payloads, runs them on remote targets through an execution channel, and
//! aggregates the outcomes into phase results and a verification report.

pub mod app;
pub mod directory;
pub mod errors;
pub mod exec;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod script;
pub mod storage;
pub mod topology;
pub mod utils;
pub mod verify;
