//! Configuration script generation
//!
//! Pure functions from the topology and a directory snapshot to the payload
//! run on one target. Nothing here performs I/O.

pub mod base;
pub mod builder;
pub mod cloud;
pub mod tunnel;
pub mod verify;

use sdwan_models::PhaseName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::{InstanceDirectory, InstanceRuntimeConfig};
use crate::topology::Topology;

pub use base::{base_setup_script, BaseSetupOptions};
pub use builder::{ShellDirective, ShellScript, VyosDirective, VyosScript};
pub use cloud::cloud_peering_script;
pub use tunnel::{vpn_bgp_script, TunnelPeer};
pub use verify::{ping_targets, verification_script};

/// Why a payload could not be produced for a router
///
/// These are expected conditions; the orchestrator turns them into a failed
/// result for the router concerned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Instance config not found for {router}")]
    MissingInstance { router: String },

    #[error("Router {router} is not part of the topology")]
    UnknownRouter { router: String },

    #[error("Router {router} is not a cloud-peering hub")]
    NotAHub { router: String },

    #[error("Tunnel peer {peer} of {router} is in {peer_region}, not {region}")]
    CrossRegionTunnel {
        router: String,
        peer: String,
        region: String,
        peer_region: String,
    },
}

/// Knobs that shape payloads but are not part of the topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOptions {
    /// Pre-shared key for every IPsec peer
    #[serde(default = "default_psk")]
    pub vpn_psk: String,

    #[serde(default)]
    pub base: BaseSetupOptions,
}

fn default_psk() -> String {
    "aws123".to_string()
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            vpn_psk: default_psk(),
            base: BaseSetupOptions::default(),
        }
    }
}

/// Renders per-phase payloads against one directory snapshot
pub struct ScriptGenerator<'a> {
    topology: &'a Topology,
    directory: &'a InstanceDirectory,
    options: &'a ScriptOptions,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(
        topology: &'a Topology,
        directory: &'a InstanceDirectory,
        options: &'a ScriptOptions,
    ) -> Self {
        Self {
            topology,
            directory,
            options,
        }
    }

    /// Host payload for `router` in `phase`
    pub fn payload(&self, phase: PhaseName, router: &str) -> Result<String, GenerateError> {
        let script = match phase {
            PhaseName::BaseSetup => self.base_setup(),
            PhaseName::VpnBgp => {
                let mut host = ShellScript::new();
                host.run_in_router("vyos-vpn", &self.vpn_bgp(router)?);
                host
            }
            PhaseName::CloudPeering => {
                let mut host = ShellScript::new();
                host.run_in_router("vyos-cloud-bgp", &self.cloud_peering(router)?);
                host
            }
            PhaseName::Verify => self.verification(router)?,
        };
        Ok(script.render())
    }

    pub fn base_setup(&self) -> ShellScript {
        base_setup_script(&self.options.base)
    }

    pub fn vpn_bgp(&self, router: &str) -> Result<VyosScript, GenerateError> {
        let config = self
            .topology
            .router(router)
            .ok_or_else(|| GenerateError::UnknownRouter {
                router: router.to_string(),
            })?;
        let instance = self.instance(router)?;

        let mut peers = Vec::new();
        for link in self.topology.peers_of(router) {
            let peer_instance = self
                .directory
                .get(&link.peer_name)
                .ok_or_else(|| GenerateError::MissingInstance {
                    router: link.peer_name.clone(),
                })?;
            if peer_instance.region != instance.region {
                return Err(GenerateError::CrossRegionTunnel {
                    router: router.to_string(),
                    peer: link.peer_name.clone(),
                    region: instance.region.clone(),
                    peer_region: peer_instance.region.clone(),
                });
            }
            let peer = self
                .topology
                .router(&link.peer_name)
                .ok_or_else(|| GenerateError::UnknownRouter {
                    router: link.peer_name.clone(),
                })?;
            peers.push(TunnelPeer {
                link,
                peer,
                peer_instance,
            });
        }

        Ok(vpn_bgp_script(config, instance, &peers, &self.options.vpn_psk))
    }

    pub fn cloud_peering(&self, router: &str) -> Result<VyosScript, GenerateError> {
        let hub = self
            .topology
            .hub(router)
            .ok_or_else(|| GenerateError::NotAHub {
                router: router.to_string(),
            })?;
        let instance = self.instance(router)?;
        Ok(cloud_peering_script(hub, &instance.cloud))
    }

    pub fn verification(&self, router: &str) -> Result<ShellScript, GenerateError> {
        if self.topology.router(router).is_none() {
            return Err(GenerateError::UnknownRouter {
                router: router.to_string(),
            });
        }
        let cloud_peers = self
            .directory
            .get(router)
            .map(|i| i.cloud.peer_addresses.as_slice())
            .unwrap_or_default();
        Ok(verification_script(self.topology, router, cloud_peers))
    }

    fn instance(&self, router: &str) -> Result<&'a InstanceRuntimeConfig, GenerateError> {
        self.directory
            .get(router)
            .ok_or_else(|| GenerateError::MissingInstance {
                router: router.to_string(),
            })
    }
}
