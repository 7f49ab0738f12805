//! Verification output parser

use std::collections::BTreeMap;

use sdwan_models::{CheckOutcome, PingOutcome, VerificationDetail};

use crate::script::ping_targets;
use crate::topology::Topology;

use super::{
    ping_fail_marker, ping_ok_marker, BGP_FAILED, CLOUD_BGP_FAILED, INTERFACES_FAILED,
    IPSEC_FAILED,
};

/// Map captured probe output for `router` to per-check outcomes
///
/// A check fails iff its failure marker is present. Each expected ping
/// target is `ok` or `fail` by its marker, `unknown` when neither marker is
/// present, and `fail` when both are.
pub fn parse(stdout: &str, router: &str, topology: &Topology) -> VerificationDetail {
    let check = |marker: &str| {
        if contains_marker(stdout, marker) {
            CheckOutcome::Fail
        } else {
            CheckOutcome::Ok
        }
    };

    let cloud_peering = if topology.is_hub(router) {
        check(CLOUD_BGP_FAILED)
    } else {
        CheckOutcome::NotApplicable
    };

    let mut ping = BTreeMap::new();
    for target in ping_targets(topology, router) {
        let ok = contains_marker(stdout, &ping_ok_marker(target));
        let fail = contains_marker(stdout, &ping_fail_marker(target));
        let outcome = match (ok, fail) {
            (_, true) => PingOutcome::Fail,
            (true, false) => PingOutcome::Ok,
            (false, false) => PingOutcome::Unknown,
        };
        ping.insert(target.to_string(), outcome);
    }

    VerificationDetail {
        tunnel: check(IPSEC_FAILED),
        peering: check(BGP_FAILED),
        interfaces: check(INTERFACES_FAILED),
        cloud_peering,
        ping,
    }
}

/// Whole-token marker match: `BGP_CHECK_FAILED` does not match inside
/// `CLOUDWAN_BGP_CHECK_FAILED`, nor `PING_OK 10.0.0.1` inside `PING_OK 10.0.0.10`.
fn contains_marker(stdout: &str, marker: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.';
    stdout.match_indices(marker).any(|(idx, _)| {
        let before = stdout[..idx].chars().next_back().map_or(true, |c| !is_word(c));
        let after = stdout[idx + marker.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word(c));
        before && after
    })
}
