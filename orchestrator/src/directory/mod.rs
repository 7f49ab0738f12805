//! Instance directory
//!
//! Resolves router names to the runtime parameters published under
//! `{prefix}/{router}/{parameter-type}` in each region's parameter store.
//! A router missing from the store, or only partially published, is a
//! reportable state and never an error.

pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::OrchestratorError;

pub use store::{MemoryParameterStore, Parameter, ParameterPage, ParameterStore};

/// Remote AS of the cloud routing fabric unless published otherwise
pub const DEFAULT_CLOUD_ASN: u32 = 64512;

/// Parameter types published per router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterType {
    InstanceId,
    OutsideEip,
    OutsidePrivateIp,
    CloudwanPeerIp1,
    CloudwanPeerIp2,
    CloudwanAsn,
    CloudwanInsideIp,
}

impl ParameterType {
    pub const ALL: [ParameterType; 7] = [
        ParameterType::InstanceId,
        ParameterType::OutsideEip,
        ParameterType::OutsidePrivateIp,
        ParameterType::CloudwanPeerIp1,
        ParameterType::CloudwanPeerIp2,
        ParameterType::CloudwanAsn,
        ParameterType::CloudwanInsideIp,
    ];

    /// Parameters without which a router cannot be targeted
    pub const REQUIRED: [ParameterType; 3] = [
        ParameterType::InstanceId,
        ParameterType::OutsideEip,
        ParameterType::OutsidePrivateIp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::InstanceId => "instance-id",
            ParameterType::OutsideEip => "outside-eip",
            ParameterType::OutsidePrivateIp => "outside-private-ip",
            ParameterType::CloudwanPeerIp1 => "cloudwan-peer-ip-1",
            ParameterType::CloudwanPeerIp2 => "cloudwan-peer-ip-2",
            ParameterType::CloudwanAsn => "cloudwan-asn",
            ParameterType::CloudwanInsideIp => "cloudwan-inside-ip",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OrchestratorError::DirectoryError(format!("unknown parameter type {}", s)))
    }
}

/// Build the store path for one router parameter
pub fn parameter_path(prefix: &str, router: &str, param: ParameterType) -> String {
    format!("/{}/{}/{}", prefix.trim_matches('/'), router, param)
}

/// Split a store path into `(router, parameter-type)` when it has exactly
/// the `{prefix}/{router}/{type}` shape. Anything else yields `None`.
pub fn split_parameter_path<'a>(prefix: &str, name: &'a str) -> Option<(&'a str, &'a str)> {
    let prefix = prefix.trim_matches('/');
    let rest = name.trim_matches('/').strip_prefix(prefix)?.strip_prefix('/')?;
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(router), Some(param), None) if !router.is_empty() && !param.is_empty() => {
            Some((router, param))
        }
        _ => None,
    }
}

/// Cloud-peering parameters of a hub router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudPeering {
    /// Configured cloud peer addresses, slot order, empty slots dropped
    pub peer_addresses: Vec<Ipv4Addr>,
    pub peer_asn: u32,
    /// Local inside address placed on the dummy interface
    pub inside_address: Option<Ipv4Addr>,
}

impl Default for CloudPeering {
    fn default() -> Self {
        Self {
            peer_addresses: Vec::new(),
            peer_asn: DEFAULT_CLOUD_ASN,
            inside_address: None,
        }
    }
}

/// Runtime parameters of one router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRuntimeConfig {
    pub router: String,
    pub region: String,
    /// Execution target identifier
    pub instance_id: String,
    pub public_address: Ipv4Addr,
    pub private_address: Ipv4Addr,
    #[serde(default)]
    pub cloud: CloudPeering,
}

/// Raw values collected for one router before validation
#[derive(Debug, Default)]
struct RawRecord {
    region: String,
    values: BTreeMap<ParameterType, String>,
}

impl RawRecord {
    fn build(self, router: &str) -> Result<InstanceRuntimeConfig, String> {
        let mut problems = Vec::new();
        for required in ParameterType::REQUIRED {
            if self.values.get(&required).map_or(true, |v| v.trim().is_empty()) {
                problems.push(format!("missing {}", required));
            }
        }

        let addr = |param: ParameterType, problems: &mut Vec<String>| -> Option<Ipv4Addr> {
            let raw = self.values.get(&param)?.trim();
            if raw.is_empty() {
                return None;
            }
            match raw.parse() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    problems.push(format!("invalid {} '{}'", param, raw));
                    None
                }
            }
        };

        let public_address = addr(ParameterType::OutsideEip, &mut problems);
        let private_address = addr(ParameterType::OutsidePrivateIp, &mut problems);

        let (Some(instance_id), Some(public_address), Some(private_address), true) = (
            self.values.get(&ParameterType::InstanceId),
            public_address,
            private_address,
            problems.is_empty(),
        ) else {
            return Err(problems.join(", "));
        };

        Ok(InstanceRuntimeConfig {
            router: router.to_string(),
            region: self.region.clone(),
            instance_id: instance_id.trim().to_string(),
            public_address,
            private_address,
            cloud: self.cloud_peering(router),
        })
    }

    fn cloud_peering(&self, router: &str) -> CloudPeering {
        let mut cloud = CloudPeering::default();

        for slot in [ParameterType::CloudwanPeerIp1, ParameterType::CloudwanPeerIp2] {
            let Some(raw) = self.values.get(&slot).map(|v| v.trim()) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            match raw.parse() {
                Ok(ip) => cloud.peer_addresses.push(ip),
                Err(_) => warn!("Ignoring {} '{}' for {}: not an IPv4 address", slot, raw, router),
            }
        }

        if let Some(raw) = self.values.get(&ParameterType::CloudwanAsn) {
            match raw.trim().parse() {
                Ok(asn) => cloud.peer_asn = asn,
                Err(_) => warn!("Ignoring cloudwan-asn '{}' for {}", raw, router),
            }
        }

        if let Some(raw) = self.values.get(&ParameterType::CloudwanInsideIp) {
            match raw.trim().parse() {
                Ok(ip) => cloud.inside_address = Some(ip),
                Err(_) => warn!("Ignoring cloudwan-inside-ip '{}' for {}", raw, router),
            }
        }

        cloud
    }
}

/// Snapshot of the instance directory for one phase invocation
#[derive(Debug, Clone, Default)]
pub struct InstanceDirectory {
    entries: BTreeMap<String, InstanceRuntimeConfig>,
    incomplete: BTreeMap<String, String>,
}

impl InstanceDirectory {
    /// Scan every region's store under `prefix`
    ///
    /// The region of an entry is the region whose store returned it; when a
    /// router shows up in several regions the first one wins. Store errors
    /// propagate.
    pub async fn load(
        store: &dyn ParameterStore,
        prefix: &str,
        regions: &[String],
    ) -> Result<Self, OrchestratorError> {
        let mut scanned = Vec::new();
        for region in regions {
            let params = store.list_by_path(region, prefix).await?;
            scanned.push((region.clone(), params));
        }
        let directory = Self::from_parameters(prefix, scanned);
        if directory.is_empty() {
            warn!("No routers published under {} in {:?}", prefix, regions);
        }
        info!(
            "Instance directory loaded: {} complete, {} incomplete",
            directory.entries.len(),
            directory.incomplete.len()
        );
        Ok(directory)
    }

    /// Assemble a directory from already-listed parameters, per region
    pub fn from_parameters(
        prefix: &str,
        scanned: impl IntoIterator<Item = (String, Vec<Parameter>)>,
    ) -> Self {
        let mut raw: BTreeMap<String, RawRecord> = BTreeMap::new();

        for (region, params) in scanned {
            for param in params {
                let Some((router, kind)) = split_parameter_path(prefix, &param.name) else {
                    debug!("Ignoring parameter {} outside the path convention", param.name);
                    continue;
                };
                let Ok(kind) = kind.parse::<ParameterType>() else {
                    debug!("Ignoring unknown parameter type in {}", param.name);
                    continue;
                };

                let record = raw.entry(router.to_string()).or_insert_with(|| RawRecord {
                    region: region.clone(),
                    values: BTreeMap::new(),
                });
                record.values.entry(kind).or_insert(param.value);
            }
        }

        let mut directory = Self::default();
        for (router, record) in raw {
            match record.build(&router) {
                Ok(config) => {
                    directory.entries.insert(router, config);
                }
                Err(reason) => {
                    warn!("Incomplete directory record for {}: {}", router, reason);
                    directory.incomplete.insert(router, reason);
                }
            }
        }
        directory
    }

    /// Build a directory from resolved entries
    pub fn from_entries(entries: impl IntoIterator<Item = InstanceRuntimeConfig>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.router.clone(), e)).collect(),
            incomplete: BTreeMap::new(),
        }
    }

    pub fn get(&self, router: &str) -> Option<&InstanceRuntimeConfig> {
        self.entries.get(router)
    }

    pub fn contains(&self, router: &str) -> bool {
        self.entries.contains_key(router)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Why a router was seen but not resolved, if it was
    pub fn incomplete_reason(&self, router: &str) -> Option<&str> {
        self.incomplete.get(router).map(String::as_str)
    }

    /// Human-readable reason a router cannot be targeted
    pub fn miss_reason(&self, router: &str) -> String {
        match self.incomplete_reason(router) {
            Some(reason) => format!("Instance config incomplete for {}: {}", router, reason),
            None => format!("Instance config not found for {}", router),
        }
    }
}
