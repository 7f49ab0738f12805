//! Payload generation against the builtin topology

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use sdwan_models::PhaseName;
use sdwan_orchestrator::directory::{CloudPeering, InstanceDirectory};
use sdwan_orchestrator::script::base::APT_PACKAGES;
use sdwan_orchestrator::script::{ping_targets, GenerateError, ScriptGenerator, ScriptOptions};
use sdwan_orchestrator::topology::Topology;

use crate::common::{full_fleet, instance, private_address, public_address};

fn hub_cloud() -> CloudPeering {
    CloudPeering {
        peer_addresses: vec![Ipv4Addr::new(10, 100, 0, 1), Ipv4Addr::new(10, 100, 0, 2)],
        peer_asn: 64512,
        inside_address: Some(Ipv4Addr::new(10, 100, 0, 5)),
    }
}

fn fleet_with_hub_cloud() -> InstanceDirectory {
    let mut fleet = full_fleet();
    fleet[0].cloud = hub_cloud();
    InstanceDirectory::from_entries(fleet)
}

#[test]
fn test_tunnel_stanzas_use_peer_addresses() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::from_entries(full_fleet());
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let script = generator.vpn_bgp("nv-sdwan").unwrap();
    let paths: Vec<&str> = script.set_paths().collect();
    let peer = format!("vpn ipsec site-to-site peer {}", public_address(2));

    for expected in [
        "interfaces loopback lo address 10.255.0.1/32".to_string(),
        "interfaces vti vti0 address 169.254.100.1/30".to_string(),
        format!("{} authentication remote-id {}", peer, private_address(2)),
        format!("{} local-address {}", peer, private_address(1)),
        format!("{} authentication pre-shared-secret 'aws123'", peer),
        format!("{} vti bind vti0", peer),
        "protocols bgp 65001 neighbor 169.254.100.2 remote-as 65002".to_string(),
        "protocols bgp 65001 neighbor 169.254.100.2 update-source 169.254.100.1".to_string(),
        "protocols bgp 65001 neighbor 169.254.100.2 ebgp-multihop 2".to_string(),
        "protocols bgp 65001 network 10.255.0.1/32".to_string(),
        "protocols bgp 65001 parameters router-id 10.255.0.1".to_string(),
    ] {
        assert!(paths.contains(&expected.as_str()), "missing `{}`", expected);
    }
    assert!(!paths.iter().any(|p| p.contains("fra-") || p.contains("169.254.100.14")));
}

#[test]
fn test_branch_peers_back_to_hub() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::from_entries(full_fleet());
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let paths: Vec<String> = generator
        .vpn_bgp("fra-branch1")
        .unwrap()
        .set_paths()
        .map(str::to_string)
        .collect();
    assert!(paths.contains(&format!(
        "vpn ipsec site-to-site peer {} local-address {}",
        public_address(3),
        private_address(4)
    )));
    assert!(paths.contains(
        &"protocols bgp 65002 neighbor 169.254.100.13 remote-as 65001".to_string()
    ));
}

#[test]
fn test_one_cipher_suite_everywhere() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::from_entries(full_fleet());
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let paths: Vec<String> = generator
        .vpn_bgp("nv-branch1")
        .unwrap()
        .set_paths()
        .map(str::to_string)
        .collect();
    let encryption: Vec<&String> = paths.iter().filter(|p| p.contains(" encryption ")).collect();
    assert_eq!(encryption.len(), 2);
    assert!(encryption.iter().all(|p| p.ends_with("encryption aes256")));
    assert!(paths.iter().any(|p| p.ends_with("ike-group IKE-GROUP proposal 1 dh-group 14")));
    assert!(paths.iter().any(|p| p.ends_with("esp-group ESP-GROUP pfs dh-group14")));
}

#[test]
fn test_router_payloads_never_remove_configuration() {
    let topology = Topology::builtin();
    let directory = fleet_with_hub_cloud();
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    for router in topology.router_names() {
        let payload = generator.payload(PhaseName::VpnBgp, &router).unwrap();
        assert!(!payload.contains("\ndelete "), "{} vpn payload removes config", router);
    }
    for hub in topology.hub_names() {
        let payload = generator.payload(PhaseName::CloudPeering, &hub).unwrap();
        assert!(payload.contains("/tmp/vyos-cloud-bgp.sh"));
        assert!(!payload.contains("\ndelete "), "{} cloud payload removes config", hub);
    }
}

#[test]
fn test_cloud_peering_for_hub() {
    let topology = Topology::builtin();
    let directory = fleet_with_hub_cloud();
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let paths: Vec<String> = generator
        .cloud_peering("nv-sdwan")
        .unwrap()
        .set_paths()
        .map(str::to_string)
        .collect();
    assert_eq!(paths[0], "interfaces dummy dum0 address 10.100.0.5/32");
    for peer in ["10.100.0.1", "10.100.0.2"] {
        let neighbor = format!("protocols bgp 65001 neighbor {}", peer);
        for expected in [
            format!("protocols static route {}/32 next-hop 10.201.1.1", peer),
            format!("{} remote-as 64512", neighbor),
            format!("{} update-source 10.100.0.5", neighbor),
            format!("{} ebgp-multihop 4", neighbor),
            format!("{} address-family ipv4-unicast", neighbor),
        ] {
            assert!(paths.contains(&expected), "missing `{}`", expected);
        }
    }
    assert!(!paths.iter().any(|p| p.contains("vti") || p.contains("ipsec")));
}

#[test]
fn test_cloud_peering_without_parameters_is_empty() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::from_entries(full_fleet());
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let script = generator.cloud_peering("fra-sdwan").unwrap();
    assert_eq!(script.set_paths().count(), 0);
}

#[test]
fn test_generation_errors() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::from_entries(vec![
        instance("nv-sdwan", "us-east-1", 1),
        instance("nv-branch1", "eu-central-1", 2),
        instance("fra-sdwan", "eu-central-1", 3),
    ]);
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    assert!(matches!(
        generator.cloud_peering("nv-branch1"),
        Err(GenerateError::NotAHub { .. })
    ));
    assert!(matches!(
        generator.vpn_bgp("nv-sdwan"),
        Err(GenerateError::CrossRegionTunnel { .. })
    ));
    assert_eq!(
        generator.vpn_bgp("fra-sdwan").unwrap_err(),
        GenerateError::MissingInstance {
            router: "fra-branch1".to_string()
        }
    );
    assert!(matches!(
        generator.payload(PhaseName::Verify, "hq-core"),
        Err(GenerateError::UnknownRouter { .. })
    ));
}

#[test]
fn test_base_setup_order() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::default();
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let payload = generator.payload(PhaseName::BaseSetup, "nv-sdwan").unwrap();
    assert!(payload.starts_with("#!/bin/bash\nset -e\n"));

    let at = |needle: &str| {
        payload
            .find(needle)
            .unwrap_or_else(|| panic!("missing `{}`", needle))
    };
    assert!(at("apt-get update -y") < at("apt-get install -y"));
    assert!(at("snap wait system seed.loaded") < at("snap install lxd"));
    assert!(at("lxc delete router") < at("lxc init vyos router"));
    assert!(at("lxc start router") < at("lxc exec router -- /tmp/vyos-phase1.sh"));

    assert_eq!(
        payload,
        generator.payload(PhaseName::BaseSetup, "fra-branch1").unwrap()
    );
}

#[test]
fn test_base_setup_installs_every_package() {
    let topology = Topology::builtin();
    let directory = InstanceDirectory::default();
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let payload = generator.payload(PhaseName::BaseSetup, "nv-sdwan").unwrap();
    let install = payload
        .lines()
        .find(|line| line.starts_with("apt-get install -y"))
        .unwrap();
    let listed: Vec<&str> = install.split_whitespace().skip(3).collect();
    for package in APT_PACKAGES {
        assert!(listed.contains(&package), "`{}` not installed", package);
    }
    assert!(payload.contains("snap install lxd\n"));
    assert!(payload.contains("snap install aws-cli --classic\n"));

    let seeded = payload.find("snap wait system seed.loaded").unwrap();
    let installs: Vec<usize> = payload.match_indices("snap install").map(|(i, _)| i).collect();
    assert_eq!(installs.len(), 2);
    assert!(installs.iter().all(|&i| seeded < i));
}

#[test]
fn test_ping_targets_match_tunnel_peers() {
    let topology = Topology::builtin();

    for router in topology.router_names() {
        let targets: BTreeSet<Ipv4Addr> = ping_targets(&topology, &router).into_iter().collect();
        let peers: BTreeSet<Ipv4Addr> = topology
            .tunnels()
            .iter()
            .filter_map(|t| {
                if t.a.router == router {
                    Some(t.b.address.addr())
                } else if t.b.router == router {
                    Some(t.a.address.addr())
                } else {
                    None
                }
            })
            .collect();
        assert!(!targets.is_empty(), "{} has nothing to ping", router);
        assert_eq!(targets, peers, "{}", router);
    }
}

#[test]
fn test_verification_probes() {
    let topology = Topology::builtin();
    let directory = fleet_with_hub_cloud();
    let options = ScriptOptions::default();
    let generator = ScriptGenerator::new(&topology, &directory, &options);

    let hub = generator.payload(PhaseName::Verify, "nv-sdwan").unwrap();
    assert!(!hub.contains("set -e"));
    assert!(hub.contains("ping -c 3 -W 2 169.254.100.2"));
    assert!(hub.contains("show ip bgp neighbors 10.100.0.1"));
    assert!(!hub.contains("169.254.100.14"));

    let branch = generator.payload(PhaseName::Verify, "nv-branch1").unwrap();
    assert!(branch.contains("ping -c 3 -W 2 169.254.100.1"));
    assert!(!branch.contains("show ip bgp neighbors"));
}
