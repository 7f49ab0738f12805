//! Phase invocation models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized terminal status of one dispatch-and-poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    Success,
    Failed,
    TimedOut,
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Success)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandStatus::Success => "Success",
            CommandStatus::Failed => "Failed",
            CommandStatus::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// Result of running one payload on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: CommandStatus,

    /// Execution id assigned by the channel; empty for synthetic results
    pub command_id: String,

    /// Execution target the payload was sent to; empty for synthetic results
    pub target_id: String,

    #[serde(default)]
    pub stdout: String,

    #[serde(default)]
    pub stderr: String,
}

impl CommandResult {
    /// A failed result that never reached the execution channel.
    pub fn synthetic_failure(reason: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failed,
            command_id: String::new(),
            target_id: String::new(),
            stdout: String::new(),
            stderr: reason.into(),
        }
    }

    /// Deadline elapsed before a terminal remote status was observed.
    pub fn timed_out(command_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::TimedOut,
            command_id: command_id.into(),
            target_id: target_id.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Outcome of a single health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Ok,
    Fail,
    NotApplicable,
}

/// Outcome of a reachability probe to one peer address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingOutcome {
    Ok,
    Fail,
    Unknown,
}

/// Structured health indicators parsed from verification output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetail {
    /// Encrypted tunnel security associations
    pub tunnel: CheckOutcome,

    /// Peering protocol sessions
    pub peering: CheckOutcome,

    pub interfaces: CheckOutcome,

    /// Cloud fabric peering; `NotApplicable` outside the hub routers
    pub cloud_peering: CheckOutcome,

    /// Peer VTI address to probe outcome
    #[serde(default)]
    pub ping: BTreeMap<String, PingOutcome>,
}

impl VerificationDetail {
    /// True when every check and every probe came back clean.
    pub fn all_passed(&self) -> bool {
        let checks_ok = [self.tunnel, self.peering, self.interfaces, self.cloud_peering]
            .iter()
            .all(|c| *c != CheckOutcome::Fail);
        checks_ok && self.ping.values().all(|p| *p == PingOutcome::Ok)
    }
}

/// Per-router entry of a phase result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterOutcome {
    #[serde(flatten)]
    pub result: CommandResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<VerificationDetail>,
}

impl RouterOutcome {
    pub fn command(result: CommandResult) -> Self {
        Self {
            result,
            details: None,
        }
    }

    pub fn verified(result: CommandResult, details: VerificationDetail) -> Self {
        Self {
            result,
            details: Some(details),
        }
    }
}

/// Phase identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    #[serde(rename = "phase1")]
    BaseSetup,
    #[serde(rename = "phase2")]
    VpnBgp,
    #[serde(rename = "phase3")]
    CloudPeering,
    #[serde(rename = "phase4")]
    Verify,
}

impl PhaseName {
    pub const ALL: [PhaseName; 4] = [
        PhaseName::BaseSetup,
        PhaseName::VpnBgp,
        PhaseName::CloudPeering,
        PhaseName::Verify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::BaseSetup => "phase1",
            PhaseName::VpnBgp => "phase2",
            PhaseName::CloudPeering => "phase3",
            PhaseName::Verify => "phase4",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phase1" | "base" | "base-setup" => Ok(PhaseName::BaseSetup),
            "phase2" | "vpn" | "vpn-bgp" => Ok(PhaseName::VpnBgp),
            "phase3" | "cloud" | "cloud-peering" => Ok(PhaseName::CloudPeering),
            "phase4" | "verify" => Ok(PhaseName::Verify),
            _ => Err(format!("Invalid phase: {}", s)),
        }
    }
}

/// Aggregate result of one phase invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: PhaseName,

    /// Router name to outcome, in target order
    #[serde(with = "ordered_results")]
    pub results: Vec<(String, RouterOutcome)>,

    pub success_count: usize,

    pub fail_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl PhaseResult {
    /// Reduce per-target outcomes into a phase result. Counters are derived
    /// here, after every target has completed.
    pub fn from_outcomes(phase: PhaseName, results: Vec<(String, RouterOutcome)>) -> Self {
        let success_count = results
            .iter()
            .filter(|(_, o)| o.result.status.is_success())
            .count();
        let fail_count = results.len() - success_count;

        Self {
            phase,
            results,
            success_count,
            fail_count,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn with_timing(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.finished_at = Some(finished_at);
        self
    }

    /// Look up the outcome for a router
    pub fn outcome(&self, router: &str) -> Option<&RouterOutcome> {
        self.results
            .iter()
            .find(|(name, _)| name == router)
            .map(|(_, o)| o)
    }

    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }
}

/// Serializes the result list as a JSON object while keeping target order.
mod ordered_results {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    use super::RouterOutcome;

    pub fn serialize<S>(results: &[(String, RouterOutcome)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(results.iter().map(|(name, outcome)| (name, outcome)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, RouterOutcome)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(String, RouterOutcome)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of router name to outcome")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, outcome)) = map.next_entry::<String, RouterOutcome>()? {
                    out.push((name, outcome));
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
