//! Verification output markers, parsing and reporting

pub mod parser;
pub mod report;

use std::net::Ipv4Addr;

pub use parser::parse;
pub use report::{format_report, persist_report};

pub const IPSEC_FAILED: &str = "IPSEC_CHECK_FAILED";
pub const BGP_FAILED: &str = "BGP_CHECK_FAILED";
pub const INTERFACES_FAILED: &str = "INTERFACES_CHECK_FAILED";
pub const CLOUD_BGP_FAILED: &str = "CLOUDWAN_BGP_CHECK_FAILED";

pub fn ping_ok_marker(target: Ipv4Addr) -> String {
    format!("PING_OK {}", target)
}

pub fn ping_fail_marker(target: Ipv4Addr) -> String {
    format!("PING_FAIL {}", target)
}
