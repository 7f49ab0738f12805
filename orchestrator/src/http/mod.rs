//! Gateway clients for remote execution and parameters

pub mod client;
pub mod commands;
pub mod parameters;

pub use client::HttpClient;
pub use commands::HttpExecutionChannel;
pub use parameters::HttpParameterStore;
