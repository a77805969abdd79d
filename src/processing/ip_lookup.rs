//! Address details, CIDR facts and utilization figures.

use crate::config::GCP_RESERVED_ADDRESSES;
use crate::models::{parse_ipv4, Cidr, CidrError, NetworkTopology, Subnet, UsedInternalIp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Facts about a CIDR block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CidrInfo {
    pub cidr: String,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub prefix_length: u8,
    pub total_hosts: u64,
    /// Total minus the addresses GCP reserves.
    pub usable_hosts: u64,
    pub first_usable: Option<Ipv4Addr>,
    pub last_usable: Option<Ipv4Addr>,
    pub is_private: bool,
}

/// Address usage of a VPC range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Utilization {
    pub vpc_cidr: String,
    pub total_ips: u64,
    pub used_ips: u64,
    /// Negative when subnets claim more than the VPC range holds.
    pub available_ips: i64,
    pub utilization_percent: f64,
    pub subnet_count: usize,
}

/// Where an internal address sits in the topology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IpDetails {
    pub ip_address: Ipv4Addr,
    pub is_used: bool,
    pub used_by: Option<UsedInternalIp>,
    pub subnet: Option<Subnet>,
    pub vpc: Option<String>,
    pub project: Option<String>,
}

/// An unused address whose last octet matched a suffix search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuffixIp {
    pub ip_address: Ipv4Addr,
    pub subnet: String,
    pub vpc: String,
    pub project: String,
    pub region: String,
    pub cidr: String,
}

/// IANA special-purpose blocks that count as private. Shared address space
/// (100.64.0.0/10) is left out: it is neither private nor global.
const SPECIAL_PURPOSE: [([u8; 4], u8); 13] = [
    ([0, 0, 0, 0], 8),
    ([10, 0, 0, 0], 8),
    ([127, 0, 0, 0], 8),
    ([169, 254, 0, 0], 16),
    ([172, 16, 0, 0], 12),
    ([192, 0, 0, 0], 24),
    ([192, 0, 2, 0], 24),
    ([192, 168, 0, 0], 16),
    ([198, 18, 0, 0], 15),
    ([198, 51, 100, 0], 24),
    ([203, 0, 113, 0], 24),
    ([240, 0, 0, 0], 4),
    ([255, 255, 255, 255], 32),
];

fn is_special_purpose(ip: Ipv4Addr) -> bool {
    SPECIAL_PURPOSE
        .iter()
        .any(|&(base, len)| Cidr::new(Ipv4Addr::from(base), len).is_ok_and(|c| c.contains(ip)))
}

/// Describe a CIDR block.
///
/// A block is private when both its network and broadcast addresses fall in
/// a special-purpose range.
pub fn cidr_info(cidr: &Cidr) -> CidrInfo {
    let (lo, hi) = cidr.range();
    let total_hosts = cidr.size();
    let (lo_bits, hi_bits) = (u32::from(lo), u32::from(hi));

    CidrInfo {
        cidr: cidr.to_string(),
        network_address: lo,
        broadcast_address: hi,
        netmask: Ipv4Addr::from(cidr.netmask()),
        prefix_length: cidr.mask(),
        total_hosts,
        usable_hosts: total_hosts.saturating_sub(GCP_RESERVED_ADDRESSES),
        first_usable: (total_hosts > 1).then(|| Ipv4Addr::from(lo_bits + 1)),
        last_usable: (total_hosts > 2).then(|| Ipv4Addr::from(hi_bits - 1)),
        is_private: is_special_purpose(lo) && is_special_purpose(hi),
    }
}

/// Sum subnet sizes against the VPC range.
///
/// Subnet ranges that do not parse are logged and left out of the count.
pub fn calculate_ip_utilization(vpc_cidr: &Cidr, subnets: &[Subnet]) -> Utilization {
    let total_ips = vpc_cidr.size();
    let used_ips: u64 = subnets
        .iter()
        .filter_map(|s| match Cidr::parse(&s.ip_cidr_range) {
            Ok(cidr) => Some(cidr.size()),
            Err(e) => {
                log::debug!("Skipping subnet '{}' in utilization: {e}", s.name);
                None
            }
        })
        .sum();

    let percent = if total_ips > 0 {
        used_ips as f64 / total_ips as f64 * 100.0
    } else {
        0.0
    };

    Utilization {
        vpc_cidr: vpc_cidr.to_string(),
        total_ips,
        used_ips,
        available_ips: total_ips as i64 - used_ips as i64,
        utilization_percent: (percent * 100.0).round() / 100.0,
        subnet_count: subnets.len(),
    }
}

/// Look up an address: who uses it and which subnet holds it.
pub fn ip_details(ip: &str, topology: &NetworkTopology) -> Result<IpDetails, CidrError> {
    let ip_address = parse_ipv4(ip)?;
    let used_by = topology
        .used_internal_ips
        .iter()
        .find(|u| parse_ipv4(&u.ip_address).is_ok_and(|a| a == ip_address))
        .cloned();

    let mut details = IpDetails {
        ip_address,
        is_used: used_by.is_some(),
        used_by,
        subnet: None,
        vpc: None,
        project: None,
    };

    for project in &topology.projects {
        for vpc in &project.vpc_networks {
            for subnet in &vpc.subnets {
                let Ok(cidr) = Cidr::parse(&subnet.ip_cidr_range) else {
                    continue;
                };
                if cidr.contains(ip_address) {
                    details.subnet = Some(subnet.clone());
                    details.vpc = Some(vpc.name.clone());
                    details.project = Some(project.project_id.clone());
                    return Ok(details);
                }
            }
        }
    }

    Ok(details)
}

/// Find free addresses ending in `suffix` across subnets.
///
/// Network, broadcast and gateway addresses and used internal IPs are
/// excluded. `vpc_names` entries match as substrings of the VPC name.
pub fn find_suffix_ips(
    suffix: u8,
    topology: &NetworkTopology,
    project_ids: &[String],
    vpc_names: &[String],
) -> Vec<SuffixIp> {
    let used: HashSet<Ipv4Addr> = topology
        .used_internal_ips
        .iter()
        .filter_map(|u| parse_ipv4(&u.ip_address).ok())
        .collect();

    let mut found = Vec::new();

    for project in &topology.projects {
        if !project_ids.is_empty() && !project_ids.contains(&project.project_id) {
            continue;
        }
        for vpc in &project.vpc_networks {
            if !vpc_names.is_empty() && !vpc_names.iter().any(|n| vpc.name.contains(n.as_str())) {
                continue;
            }
            for subnet in &vpc.subnets {
                let Ok(cidr) = Cidr::parse(&subnet.ip_cidr_range) else {
                    log::debug!("Skipping subnet '{}': bad range {}", subnet.name, subnet.ip_cidr_range);
                    continue;
                };
                let gateway = subnet.gateway_ip.as_deref().and_then(|g| parse_ipv4(g).ok());
                let (lo, hi) = (u64::from(u32::from(cidr.lo())), u64::from(u32::from(cidr.hi())));

                // first address at or above lo whose low byte is the suffix
                let mut candidate = (lo & !0xFF) | u64::from(suffix);
                if candidate < lo {
                    candidate += 256;
                }

                while candidate <= hi {
                    let ip = Ipv4Addr::from(candidate as u32);
                    let reserved = candidate == lo || candidate == hi || gateway == Some(ip);
                    if !reserved && !used.contains(&ip) {
                        found.push(SuffixIp {
                            ip_address: ip,
                            subnet: subnet.name.clone(),
                            vpc: vpc.name.clone(),
                            project: project.project_id.clone(),
                            region: subnet.region.clone(),
                            cidr: subnet.ip_cidr_range.clone(),
                        });
                    }
                    candidate += 256;
                }
            }
        }
    }

    found
}
