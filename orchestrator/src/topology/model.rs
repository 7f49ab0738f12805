//! Topology value types

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// AS number shared by every SD-WAN hub router
pub const SDWAN_ASN: u32 = 65001;

/// AS number shared by every branch router
pub const BRANCH_ASN: u32 = 65002;

/// Router role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sdwan,
    Branch,
}

impl Role {
    /// The AS number is a function of the role.
    pub fn asn(self) -> u32 {
        match self {
            Role::Sdwan => SDWAN_ASN,
            Role::Branch => BRANCH_ASN,
        }
    }
}

/// Static per-router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    pub role: Role,
    pub asn: u32,
    /// Loopback host address, no mask
    pub loopback: Ipv4Addr,
}

impl RouterConfig {
    pub fn new(name: impl Into<String>, role: Role, loopback: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            role,
            asn: role.asn(),
            loopback,
        }
    }
}

/// One side of a tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtiEndpoint {
    pub router: String,

    /// VTI interface name on the router, e.g. `vti0`
    pub interface: String,

    /// VTI address with its /30 mask
    pub address: Ipv4Net,
}

/// Intra-region encrypted tunnel between two routers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub a: VtiEndpoint,
    pub b: VtiEndpoint,
}

impl Tunnel {
    pub fn new(a: VtiEndpoint, b: VtiEndpoint) -> Self {
        Self { a, b }
    }

    /// Returns (local, remote) when `router` terminates this tunnel
    pub fn sides_for(&self, router: &str) -> Option<(&VtiEndpoint, &VtiEndpoint)> {
        if self.a.router == router {
            Some((&self.a, &self.b))
        } else if self.b.router == router {
            Some((&self.b, &self.a))
        } else {
            None
        }
    }
}

/// A router that additionally peers with the cloud routing fabric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    pub router: String,

    /// First address of the hub's private subnet; next hop toward cloud peers
    pub private_subnet_gateway: Ipv4Addr,
}

/// A tunnel as seen from one of its endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerLink {
    pub local_vti_name: String,
    pub local_vti_cidr: Ipv4Net,
    pub peer_name: String,
    pub peer_vti_host: Ipv4Addr,
}

impl PeerLink {
    /// Local VTI address without its mask
    pub fn local_vti_host(&self) -> Ipv4Addr {
        self.local_vti_cidr.addr()
    }
}
