//! Tunnel and peering phase: loopback, VTIs, IPsec peers, BGP neighbors

use crate::directory::InstanceRuntimeConfig;
use crate::topology::{PeerLink, RouterConfig};

use super::builder::VyosScript;

pub const ESP_GROUP: &str = "ESP-GROUP";
pub const IKE_GROUP: &str = "IKE-GROUP";

/// Symmetric cipher for both IKE and ESP proposals
pub const CIPHER: &str = "aes256";
pub const HASH: &str = "sha256";
pub const DH_GROUP: u8 = 14;

/// One tunnel of the router being configured, with its peer resolved
#[derive(Debug, Clone)]
pub struct TunnelPeer<'a> {
    pub link: PeerLink,
    pub peer: &'a RouterConfig,
    pub peer_instance: &'a InstanceRuntimeConfig,
}

/// Router script bringing up every tunnel of `router`
///
/// A router without tunnels still gets its loopback, IPsec groups and BGP
/// router-id; it simply has no peer or neighbor stanzas.
pub fn vpn_bgp_script(
    router: &RouterConfig,
    instance: &InstanceRuntimeConfig,
    peers: &[TunnelPeer<'_>],
    psk: &str,
) -> VyosScript {
    let mut vyos = VyosScript::new();
    let asn = router.asn;
    let loopback = router.loopback;

    vyos.section("Loopback")
        .set(format!("interfaces loopback lo address {}/32", loopback));

    for t in peers {
        vyos.section(format!("VTI to {}", t.link.peer_name)).set(format!(
            "interfaces vti {} address {}",
            t.link.local_vti_name, t.link.local_vti_cidr
        ));
    }

    vyos.section("IPsec global settings")
        .set("vpn ipsec interface eth0")
        .set(format!("vpn ipsec esp-group {} compression disable", ESP_GROUP))
        .set(format!("vpn ipsec esp-group {} lifetime 3600", ESP_GROUP))
        .set(format!("vpn ipsec esp-group {} mode tunnel", ESP_GROUP))
        .set(format!("vpn ipsec esp-group {} pfs dh-group{}", ESP_GROUP, DH_GROUP))
        .set(format!("vpn ipsec esp-group {} proposal 1 encryption {}", ESP_GROUP, CIPHER))
        .set(format!("vpn ipsec esp-group {} proposal 1 hash {}", ESP_GROUP, HASH))
        .set(format!("vpn ipsec ike-group {} key-exchange ikev2", IKE_GROUP))
        .set(format!("vpn ipsec ike-group {} lifetime 28800", IKE_GROUP))
        .set(format!("vpn ipsec ike-group {} proposal 1 dh-group {}", IKE_GROUP, DH_GROUP))
        .set(format!("vpn ipsec ike-group {} proposal 1 encryption {}", IKE_GROUP, CIPHER))
        .set(format!("vpn ipsec ike-group {} proposal 1 hash {}", IKE_GROUP, HASH));

    for t in peers {
        let peer = format!(
            "vpn ipsec site-to-site peer {}",
            t.peer_instance.public_address
        );
        vyos.section(format!("IPsec peer: {}", t.link.peer_name))
            .set(format!("{} authentication mode pre-shared-secret", peer))
            .set(format!("{} authentication pre-shared-secret '{}'", peer, psk))
            .set(format!(
                "{} authentication remote-id {}",
                peer, t.peer_instance.private_address
            ))
            .set(format!("{} connection-type initiate", peer))
            .set(format!("{} ike-group {}", peer, IKE_GROUP))
            .set(format!("{} local-address {}", peer, instance.private_address))
            .set(format!("{} vti bind {}", peer, t.link.local_vti_name))
            .set(format!("{} vti esp-group {}", peer, ESP_GROUP));
    }

    for t in peers {
        let neighbor = format!("protocols bgp {} neighbor {}", asn, t.link.peer_vti_host);
        vyos.section(format!("BGP neighbor: {}", t.link.peer_name))
            .set(format!("{} ebgp-multihop 2", neighbor))
            .set(format!("{} remote-as {}", neighbor, t.peer.asn))
            .set(format!("{} update-source {}", neighbor, t.link.local_vti_host()));
    }

    vyos.section("BGP origination")
        .set(format!("protocols bgp {} network {}/32", asn, loopback))
        .set(format!("protocols bgp {} parameters router-id {}", asn, loopback));

    vyos
}
