//! Cloud-peering phase for hub routers
//!
//! Peering with the cloud fabric runs directly over the hub's private subnet,
//! with no tunnel. Everything here is layered on top of the tunnel/peering
//! configuration and touches none of it.

use crate::directory::CloudPeering;
use crate::topology::model::SDWAN_ASN;
use crate::topology::HubConfig;

use super::builder::VyosScript;

/// Router script adding cloud peers to a hub
///
/// Absent inputs drop their stanza: no inside address means no dummy
/// interface and no update-source, no peer addresses means no routes or
/// neighbors.
pub fn cloud_peering_script(hub: &HubConfig, cloud: &CloudPeering) -> VyosScript {
    let mut vyos = VyosScript::new();

    if let Some(inside) = cloud.inside_address {
        vyos.section("Dummy interface holding the cloud peering inside address")
            .set(format!("interfaces dummy dum0 address {}/32", inside));
    }

    if !cloud.peer_addresses.is_empty() {
        vyos.section("Static routes to cloud peers via the private subnet gateway");
        for peer in &cloud.peer_addresses {
            vyos.set(format!(
                "protocols static route {}/32 next-hop {}",
                peer, hub.private_subnet_gateway
            ));
        }
    }

    for (slot, peer) in cloud.peer_addresses.iter().enumerate() {
        let neighbor = format!("protocols bgp {} neighbor {}", SDWAN_ASN, peer);
        vyos.section(format!("Cloud BGP neighbor {}", slot + 1))
            .set(format!("{} remote-as {}", neighbor, cloud.peer_asn));
        if let Some(inside) = cloud.inside_address {
            vyos.set(format!("{} update-source {}", neighbor, inside));
        }
        vyos.set(format!("{} ebgp-multihop 4", neighbor))
            .set(format!("{} address-family ipv4-unicast", neighbor));
    }

    vyos
}
