//! Verification probes: read-only inspection plus VTI reachability

use std::net::Ipv4Addr;

use crate::topology::Topology;
use crate::verify::{
    ping_fail_marker, ping_ok_marker, BGP_FAILED, CLOUD_BGP_FAILED, INTERFACES_FAILED,
    IPSEC_FAILED,
};

use super::builder::ShellScript;

/// Operational-mode command runner inside the router container
pub const OP_WRAPPER: &str = "/opt/vyatta/bin/vyatta-op-cmd-wrapper";

/// Peer VTI host addresses `router` should be able to reach
pub fn ping_targets(topology: &Topology, router: &str) -> Vec<Ipv4Addr> {
    topology
        .peers_of(router)
        .into_iter()
        .map(|p| p.peer_vti_host)
        .collect()
}

/// Probe script for one router; `cloud_peers` is only consulted for hubs
pub fn verification_script(
    topology: &Topology,
    router: &str,
    cloud_peers: &[Ipv4Addr],
) -> ShellScript {
    let mut script = ShellScript::lenient();
    script.line(format!("echo \"=== Verifying {} ===\"", router));

    for (title, command, marker) in [
        ("IPsec SA Status", "show vpn ipsec sa", IPSEC_FAILED),
        ("BGP Summary", "show ip bgp summary", BGP_FAILED),
        ("Interfaces", "show interfaces", INTERFACES_FAILED),
    ] {
        script
            .blank()
            .line(format!("echo \"--- {} ---\"", title))
            .line(op_command(command, marker));
    }

    if topology.is_hub(router) {
        for peer in cloud_peers {
            script
                .blank()
                .line(format!("echo \"--- Cloud BGP Neighbor {} ---\"", peer))
                .line(op_command(
                    &format!("show ip bgp neighbors {}", peer),
                    CLOUD_BGP_FAILED,
                ));
        }
    }

    script.blank().line("echo \"--- Ping Tests ---\"");
    for target in ping_targets(topology, router) {
        script.line(format!(
            "lxc exec router -- ping -c 3 -W 2 {} && echo \"{}\" || echo \"{}\"",
            target,
            ping_ok_marker(target),
            ping_fail_marker(target)
        ));
    }

    script
        .blank()
        .line(format!("echo \"=== Verification complete for {} ===\"", router));
    script
}

fn op_command(command: &str, failure_marker: &str) -> String {
    format!(
        "lxc exec router -- {} {} || echo \"{}\"",
        OP_WRAPPER, command, failure_marker
    )
}
