//! Settings file management

use std::path::Path;
use std::time::Duration;

use sdwan_models::PhaseName;
use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::script::ScriptOptions;
use crate::topology::{Topology, TopologySpec};

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// Root of the `{prefix}/{router}/{type}` parameter tree
    #[serde(default = "default_param_prefix")]
    pub param_prefix: String,

    /// Regions scanned for directory parameters
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Delay between status polls in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub timeouts: PhaseTimeouts,

    /// Targets dispatched concurrently; 1 processes them one after another
    #[serde(default = "default_max_parallel")]
    pub max_parallel_targets: usize,

    /// Parameter receiving the rendered verification report
    #[serde(default = "default_report_parameter")]
    pub report_parameter: String,

    #[serde(default = "default_report_region")]
    pub report_region: String,

    #[serde(default)]
    pub scripts: ScriptOptions,

    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Replaces the built-in topology when present
    #[serde(default)]
    pub topology: Option<TopologySpec>,
}

fn default_param_prefix() -> String {
    "/sdwan/".to_string()
}

fn default_regions() -> Vec<String> {
    vec!["us-east-1".to_string(), "eu-central-1".to_string()]
}

fn default_poll_interval() -> u64 {
    15
}

fn default_max_parallel() -> usize {
    1
}

fn default_report_parameter() -> String {
    "/sdwan/verification-results".to_string()
}

fn default_report_region() -> String {
    "us-east-1".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            param_prefix: default_param_prefix(),
            regions: default_regions(),
            poll_interval_secs: default_poll_interval(),
            timeouts: PhaseTimeouts::default(),
            max_parallel_targets: default_max_parallel(),
            report_parameter: default_report_parameter(),
            report_region: default_report_region(),
            scripts: ScriptOptions::default(),
            gateway: GatewaySettings::default(),
            topology: None,
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OrchestratorError> {
        File::new(path.as_ref()).read_json_or_default().await
    }

    /// Validated topology, from the override or the built-in one
    pub fn topology(&self) -> Result<Topology, OrchestratorError> {
        match &self.topology {
            Some(spec) => Topology::try_from(spec.clone()),
            None => Ok(Topology::builtin()),
        }
    }
}

/// Per-phase wait bounds in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimeouts {
    #[serde(default = "default_base_setup_timeout")]
    pub base_setup_secs: u64,

    #[serde(default = "default_phase_timeout")]
    pub vpn_bgp_secs: u64,

    #[serde(default = "default_phase_timeout")]
    pub cloud_peering_secs: u64,

    #[serde(default = "default_phase_timeout")]
    pub verify_secs: u64,
}

fn default_base_setup_timeout() -> u64 {
    600
}

fn default_phase_timeout() -> u64 {
    300
}

impl PhaseTimeouts {
    pub fn for_phase(&self, phase: PhaseName) -> Duration {
        let secs = match phase {
            PhaseName::BaseSetup => self.base_setup_secs,
            PhaseName::VpnBgp => self.vpn_bgp_secs,
            PhaseName::CloudPeering => self.cloud_peering_secs,
            PhaseName::Verify => self.verify_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            base_setup_secs: default_base_setup_timeout(),
            vpn_bgp_secs: default_phase_timeout(),
            cloud_peering_secs: default_phase_timeout(),
            verify_secs: default_phase_timeout(),
        }
    }
}

/// Remote gateway endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL of the execution gateway
    #[serde(default = "default_gateway_url")]
    pub execution_url: String,

    /// Base URL of the parameter gateway
    #[serde(default = "default_gateway_url")]
    pub parameters_url: String,

    /// Bearer token sent to both gateways
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            execution_url: default_gateway_url(),
            parameters_url: default_gateway_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}
