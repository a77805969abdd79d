//! Scanned GCP network topology snapshot.
//!
//! CIDR fields stay as the scanner reported them and are parsed on use, so a
//! single malformed range does not stop a snapshot from loading.

use super::{CloudArmorPolicy, FirewallRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Secondary (alias) range attached to a subnet.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SecondaryRange {
    /// Range name, e.g. "pods" or "services".
    #[serde(default)]
    pub range_name: Option<String>,
    /// CIDR block as reported.
    #[serde(default)]
    pub ip_cidr_range: String,
}

/// Represents a GCP subnet within a VPC.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Subnet {
    pub name: String,
    pub region: String,
    pub ip_cidr_range: String,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub secondary_ip_ranges: Vec<SecondaryRange>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub self_link: String,
}

/// Represents a GCP VPC network.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VpcNetwork {
    pub name: String,
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub is_shared_vpc_host: bool,
}

/// Represents a GCP project with its networks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub project_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub vpc_networks: Vec<VpcNetwork>,
    #[serde(default)]
    pub scan_status: Option<String>,
}

/// Internal address in use by a resource.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UsedInternalIp {
    pub ip_address: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub vpc: String,
    #[serde(default)]
    pub subnet: String,
    #[serde(default)]
    pub region: String,
}

/// External address and the resource holding it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PublicIp {
    pub ip_address: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub region: String,
    /// "IN_USE" or "RESERVED".
    #[serde(default)]
    pub status: String,
}

/// Root of a scan result.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NetworkTopology {
    pub scan_id: String,
    #[serde(default)]
    pub scan_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub public_ips: Vec<PublicIp>,
    #[serde(default)]
    pub used_internal_ips: Vec<UsedInternalIp>,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRule>,
    #[serde(default)]
    pub cloud_armor_policies: Vec<CloudArmorPolicy>,
}

/// A primary or secondary range together with where it lives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetRef {
    pub subnet_name: String,
    pub vpc_name: String,
    pub vpc_self_link: String,
    pub project_id: String,
    pub region: String,
}

impl NetworkTopology {
    /// Every primary and secondary range as `(cidr text, owner)`.
    ///
    /// Secondary ranges are named `<subnet>:<range_name>`; ranges without a
    /// CIDR string are skipped.
    pub fn subnet_refs(&self) -> Vec<(&str, SubnetRef)> {
        let mut refs = Vec::new();
        for project in &self.projects {
            for vpc in &project.vpc_networks {
                for subnet in &vpc.subnets {
                    let owner = |subnet_name: String| SubnetRef {
                        subnet_name,
                        vpc_name: vpc.name.clone(),
                        vpc_self_link: vpc.self_link.clone(),
                        project_id: project.project_id.clone(),
                        region: subnet.region.clone(),
                    };
                    refs.push((subnet.ip_cidr_range.as_str(), owner(subnet.name.clone())));

                    for secondary in &subnet.secondary_ip_ranges {
                        if secondary.ip_cidr_range.trim().is_empty() {
                            continue;
                        }
                        let name = format!(
                            "{}:{}",
                            subnet.name,
                            secondary.range_name.as_deref().unwrap_or("secondary")
                        );
                        refs.push((secondary.ip_cidr_range.as_str(), owner(name)));
                    }
                }
            }
        }
        refs
    }

    /// Find a project by id.
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    /// Total number of subnets across all projects.
    pub fn subnet_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| &p.vpc_networks)
            .map(|v| v.subnets.len())
            .sum()
    }
}
