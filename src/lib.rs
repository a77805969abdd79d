//! IPv4 range reasoning for GCP network planning.
//!
//! Checks candidate CIDRs against a scanned topology, finds free blocks,
//! looks up addresses and simulates which rules an address would hit.

pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod processing;
pub mod topology;

use models::{parse_ipv4, Cidr, NetworkTopology};
use std::error::Error;

/// Load the snapshot named by `settings`, or `path` when given.
pub fn load_topology(
    path: Option<&str>,
    settings: &config::Settings,
) -> Result<NetworkTopology, Box<dyn Error>> {
    topology::read_topology(Some(path.unwrap_or(&settings.topology_file)))
}

/// Membership test for interactive callers: malformed input is "no match".
///
/// # Examples
/// ```
/// assert!(gcp_network_planner::cidr_matches("192.168.1.0/24", "192.168.1.200"));
/// assert!(!gcp_network_planner::cidr_matches("192.168.1.0", "192.168.1.200"));
/// ```
pub fn cidr_matches(cidr: &str, ip: &str) -> bool {
    match (Cidr::parse(cidr.trim()), parse_ipv4(ip.trim())) {
        (Ok(cidr), Ok(ip)) => cidr.contains(ip),
        (Err(e), _) | (_, Err(e)) => {
            log::debug!("cidr_matches({cidr}, {ip}): {e}");
            false
        }
    }
}
