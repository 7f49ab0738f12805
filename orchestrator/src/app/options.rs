//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use sdwan_models::PhaseName;

use crate::exec::{PollOptions, DEFAULT_POLL_INTERVAL};
use crate::script::ScriptOptions;
use crate::storage::settings::{GatewaySettings, PhaseTimeouts, Settings};

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Phase execution options
    pub run: RunOptions,

    /// Where commands and parameters go
    pub backend: BackendOptions,
}

impl AppOptions {
    pub fn from_settings(settings: &Settings, backend: BackendOptions) -> Self {
        Self {
            run: RunOptions::from(settings),
            backend,
        }
    }
}

/// Execution and parameter backends
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Record payloads instead of running them
    pub dry_run: bool,

    /// Serve directory parameters from this JSON file instead of the gateway
    pub params_file: Option<PathBuf>,

    pub gateway: GatewaySettings,
}

/// Phase execution options
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub param_prefix: String,

    /// Regions scanned for directory parameters
    pub regions: Vec<String>,

    /// Concurrency bound; 1 means strictly sequential
    pub max_parallel_targets: usize,

    pub poll_interval: Duration,

    pub timeouts: PhaseTimeouts,

    pub report: ReportOptions,

    pub scripts: ScriptOptions,
}

impl RunOptions {
    pub fn poll_for(&self, phase: PhaseName) -> PollOptions {
        PollOptions::new(self.poll_interval, self.timeouts.for_phase(phase))
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            param_prefix: "/sdwan/".to_string(),
            regions: vec!["us-east-1".to_string(), "eu-central-1".to_string()],
            max_parallel_targets: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeouts: PhaseTimeouts::default(),
            report: ReportOptions::default(),
            scripts: ScriptOptions::default(),
        }
    }
}

impl From<&Settings> for RunOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            param_prefix: settings.param_prefix.clone(),
            regions: settings.regions.clone(),
            max_parallel_targets: settings.max_parallel_targets.max(1),
            poll_interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            timeouts: settings.timeouts.clone(),
            report: ReportOptions {
                parameter: settings.report_parameter.clone(),
                region: settings.report_region.clone(),
            },
            scripts: settings.scripts.clone(),
        }
    }
}

/// Verification report destination
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub parameter: String,
    pub region: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            parameter: "/sdwan/verification-results".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}
