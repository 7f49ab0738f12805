//! Declarative topology: routers, tunnels and cloud-peering hubs
//!
//! A [`Topology`] is built once at process start, validated, and then passed
//! by reference to the script generator and the orchestrator.

pub mod model;
pub mod regions;

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;

pub use model::{HubConfig, PeerLink, Role, RouterConfig, Tunnel, VtiEndpoint};
pub use regions::{RegionMap, RegionRule};

/// Serializable topology description, validated into a [`Topology`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    pub routers: Vec<RouterConfig>,
    pub tunnels: Vec<Tunnel>,
    #[serde(default)]
    pub hubs: Vec<HubConfig>,
    #[serde(default)]
    pub regions: RegionMap,
}

/// Validated, immutable topology
#[derive(Debug, Clone)]
pub struct Topology {
    routers: Vec<RouterConfig>,
    tunnels: Vec<Tunnel>,
    hubs: Vec<HubConfig>,
    regions: RegionMap,
}

impl Topology {
    /// Build and validate a topology
    pub fn new(
        routers: Vec<RouterConfig>,
        tunnels: Vec<Tunnel>,
        hubs: Vec<HubConfig>,
        regions: RegionMap,
    ) -> Result<Self, OrchestratorError> {
        let topology = Self {
            routers,
            tunnels,
            hubs,
            regions,
        };
        topology.validate()?;
        Ok(topology)
    }

    /// The four-router, two-tunnel build-out with one hub per region
    pub fn builtin() -> Self {
        let routers = vec![
            RouterConfig::new("nv-sdwan", Role::Sdwan, Ipv4Addr::new(10, 255, 0, 1)),
            RouterConfig::new("nv-branch1", Role::Branch, Ipv4Addr::new(10, 255, 1, 1)),
            RouterConfig::new("fra-sdwan", Role::Sdwan, Ipv4Addr::new(10, 255, 10, 1)),
            RouterConfig::new("fra-branch1", Role::Branch, Ipv4Addr::new(10, 255, 11, 1)),
        ];
        let tunnels = vec![
            Tunnel::new(
                vti("nv-sdwan", Ipv4Addr::new(169, 254, 100, 1)),
                vti("nv-branch1", Ipv4Addr::new(169, 254, 100, 2)),
            ),
            Tunnel::new(
                vti("fra-sdwan", Ipv4Addr::new(169, 254, 100, 13)),
                vti("fra-branch1", Ipv4Addr::new(169, 254, 100, 14)),
            ),
        ];
        let hubs = vec![
            HubConfig {
                router: "nv-sdwan".to_string(),
                private_subnet_gateway: Ipv4Addr::new(10, 201, 1, 1),
            },
            HubConfig {
                router: "fra-sdwan".to_string(),
                private_subnet_gateway: Ipv4Addr::new(10, 200, 1, 1),
            },
        ];

        Self {
            routers,
            tunnels,
            hubs,
            regions: RegionMap::default(),
        }
    }

    pub fn routers(&self) -> &[RouterConfig] {
        &self.routers
    }

    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn hubs(&self) -> &[HubConfig] {
        &self.hubs
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn router(&self, name: &str) -> Option<&RouterConfig> {
        self.routers.iter().find(|r| r.name == name)
    }

    pub fn hub(&self, name: &str) -> Option<&HubConfig> {
        self.hubs.iter().find(|h| h.router == name)
    }

    pub fn is_hub(&self, name: &str) -> bool {
        self.hub(name).is_some()
    }

    /// Router names in declaration order
    pub fn router_names(&self) -> Vec<String> {
        self.routers.iter().map(|r| r.name.clone()).collect()
    }

    /// Hub router names in declaration order
    pub fn hub_names(&self) -> Vec<String> {
        self.hubs.iter().map(|h| h.router.clone()).collect()
    }

    /// Tunnels terminating on `router`, each seen from that router, in
    /// declaration order. Empty when the router has no tunnels.
    pub fn peers_of(&self, router: &str) -> Vec<PeerLink> {
        self.tunnels
            .iter()
            .filter_map(|t| t.sides_for(router))
            .map(|(local, remote)| PeerLink {
                local_vti_name: local.interface.clone(),
                local_vti_cidr: local.address,
                peer_name: remote.router.clone(),
                peer_vti_host: remote.address.addr(),
            })
            .collect()
    }

    fn validate(&self) -> Result<(), OrchestratorError> {
        let mut names = HashSet::new();
        let mut loopbacks = HashSet::new();
        for router in &self.routers {
            if !names.insert(router.name.as_str()) {
                return Err(topology_err(format!("duplicate router {}", router.name)));
            }
            if router.asn != router.role.asn() {
                return Err(topology_err(format!(
                    "router {} has AS {} but role {:?} requires {}",
                    router.name,
                    router.asn,
                    router.role,
                    router.role.asn()
                )));
            }
            if !loopbacks.insert(router.loopback) {
                return Err(topology_err(format!(
                    "loopback {} of {} is already in use",
                    router.loopback, router.name
                )));
            }
            self.regions.region_for(&router.name)?;
        }

        let mut interfaces = HashSet::new();
        for tunnel in &self.tunnels {
            for side in [&tunnel.a, &tunnel.b] {
                if !names.contains(side.router.as_str()) {
                    return Err(topology_err(format!(
                        "tunnel endpoint {} is not a declared router",
                        side.router
                    )));
                }
                if !interfaces.insert((side.router.as_str(), side.interface.as_str())) {
                    return Err(topology_err(format!(
                        "interface {} of {} is used by more than one tunnel",
                        side.interface, side.router
                    )));
                }
            }
            check_point_to_point(tunnel.a.address, tunnel.b.address)?;

            let region_a = self.regions.region_for(&tunnel.a.router)?;
            let region_b = self.regions.region_for(&tunnel.b.router)?;
            if region_a != region_b {
                return Err(topology_err(format!(
                    "tunnel {} <-> {} crosses regions ({} / {})",
                    tunnel.a.router, tunnel.b.router, region_a, region_b
                )));
            }
        }

        for hub in &self.hubs {
            if !names.contains(hub.router.as_str()) {
                return Err(topology_err(format!(
                    "hub {} is not a declared router",
                    hub.router
                )));
            }
        }

        Ok(())
    }
}

impl TryFrom<TopologySpec> for Topology {
    type Error = OrchestratorError;

    fn try_from(spec: TopologySpec) -> Result<Self, Self::Error> {
        Topology::new(spec.routers, spec.tunnels, spec.hubs, spec.regions)
    }
}

fn vti(router: &str, host: Ipv4Addr) -> VtiEndpoint {
    VtiEndpoint {
        router: router.to_string(),
        interface: "vti0".to_string(),
        // /30 is a valid prefix length for any address
        address: Ipv4Net::new(host, 30).unwrap_or_else(|_| Ipv4Net::from(host)),
    }
}

/// Both addresses must be the two usable hosts of one /30.
fn check_point_to_point(a: Ipv4Net, b: Ipv4Net) -> Result<(), OrchestratorError> {
    if a.prefix_len() != 30 || b.prefix_len() != 30 {
        return Err(topology_err(format!("VTI pair {} / {} is not /30", a, b)));
    }
    if a.network() != b.network() {
        return Err(topology_err(format!(
            "VTI pair {} / {} spans two subnets",
            a, b
        )));
    }
    let hosts: Vec<Ipv4Addr> = a.hosts().collect();
    if a.addr() == b.addr() || !hosts.contains(&a.addr()) || !hosts.contains(&b.addr()) {
        return Err(topology_err(format!(
            "VTI pair {} / {} must use both usable hosts of {}",
            a,
            b,
            a.trunc()
        )));
    }
    Ok(())
}

fn topology_err(msg: String) -> OrchestratorError {
    OrchestratorError::TopologyError(msg)
}
