//! Risk findings over a topology snapshot.
//!
//! Two checks run on data the scanner already collected:
//! - enabled `ALLOW` ingress firewall rules open to `0.0.0.0/0` that let in
//!   every protocol or a well-known admin/database port;
//! - static external addresses left in the `RESERVED` state (paid for, not
//!   attached to anything).

use crate::models::{Cidr, FirewallPermission, FirewallRule, NetworkTopology, PublicIp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ports worth flagging when reachable from anywhere.
pub const RISKY_PORTS: [(u16, &str); 6] = [
    (22, "SSH"),
    (3389, "RDP"),
    (21, "FTP"),
    (23, "Telnet"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Firewall,
    Cost,
}

/// One finding with a suggested fix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecurityIssue {
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub resource_name: String,
    pub project_id: String,
    pub remediation: String,
}

/// Issue counts per severity and per category.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SecuritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
}

impl SecuritySummary {
    fn from_issues(issues: &[SecurityIssue]) -> SecuritySummary {
        let mut summary = SecuritySummary {
            total: issues.len(),
            ..Default::default()
        };
        for issue in issues {
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            *summary.by_category.entry(issue.category).or_insert(0) += 1;
        }
        summary
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecurityReport {
    pub issues: Vec<SecurityIssue>,
    pub generated_at: DateTime<Utc>,
    pub summary: SecuritySummary,
}

/// Run every check over `topology`.
pub fn analyze_security(topology: &NetworkTopology) -> SecurityReport {
    let mut issues = analyze_firewalls(&topology.firewall_rules);
    issues.extend(analyze_public_ips(&topology.public_ips));

    let summary = SecuritySummary::from_issues(&issues);
    log::info!(
        "Security analysis: {} issue(s), {} critical, {} high",
        summary.total,
        summary.critical,
        summary.high
    );

    SecurityReport {
        issues,
        generated_at: Utc::now(),
        summary,
    }
}

/// A source range that admits every address. Unparsable ranges do not count.
fn is_open_to_world(rule: &FirewallRule) -> bool {
    rule.source_ranges.iter().any(|range| match Cidr::parse(range.trim()) {
        Ok(cidr) => cidr.mask() == 0,
        Err(e) => {
            log::debug!("Skipping source range in rule '{}': {e}", rule.name);
            false
        }
    })
}

/// Whether a port spec ("22" or "20-23") covers `port`.
fn port_spec_covers(spec: &str, port: u16) -> bool {
    let spec = spec.trim();
    let (lo, hi) = spec.split_once('-').unwrap_or((spec, spec));
    match (lo.trim().parse::<u16>(), hi.trim().parse::<u16>()) {
        (Ok(lo), Ok(hi)) => lo <= port && port <= hi,
        _ => {
            log::debug!("Ignoring port spec '{spec}'");
            false
        }
    }
}

/// An empty port list opens every port of the protocol.
fn permission_covers(permission: &FirewallPermission, port: u16) -> bool {
    permission.ports.is_empty() || permission.ports.iter().any(|spec| port_spec_covers(spec, port))
}

/// Findings for enabled `ALLOW` ingress rules open to the internet.
pub fn analyze_firewalls(rules: &[FirewallRule]) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();

    for rule in rules {
        if rule.disabled
            || !rule.action.eq_ignore_ascii_case("ALLOW")
            || !rule.direction.eq_ignore_ascii_case("INGRESS")
            || !is_open_to_world(rule)
        {
            continue;
        }

        for permission in &rule.allowed {
            let protocol = permission.ip_protocol.to_ascii_lowercase();
            if protocol == "all" {
                issues.push(SecurityIssue {
                    severity: Severity::Critical,
                    category: Category::Firewall,
                    title: "Firewall allows all traffic from 0.0.0.0/0".to_string(),
                    description: format!(
                        "Rule {} allows all protocols/ports from the internet.",
                        rule.name
                    ),
                    resource_name: rule.name.clone(),
                    project_id: rule.project_id.clone(),
                    remediation: "Restrict source ranges to specific IPs or use IAP.".to_string(),
                });
                continue;
            }
            if protocol != "tcp" && protocol != "udp" {
                continue;
            }

            for (port, service) in RISKY_PORTS {
                if !permission_covers(permission, port) {
                    continue;
                }
                let severity = if port == 22 || port == 3389 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                issues.push(SecurityIssue {
                    severity,
                    category: Category::Firewall,
                    title: format!("Open {service} Port ({port}) to Internet"),
                    description: format!(
                        "Rule {} allows {service} traffic from 0.0.0.0/0.",
                        rule.name
                    ),
                    resource_name: rule.name.clone(),
                    project_id: rule.project_id.clone(),
                    remediation: "Restrict source ranges or use IAP.".to_string(),
                });
            }
        }
    }

    issues
}

/// Findings for static external addresses nothing uses.
pub fn analyze_public_ips(public_ips: &[PublicIp]) -> Vec<SecurityIssue> {
    public_ips
        .iter()
        .filter(|ip| ip.status == "RESERVED")
        .map(|ip| SecurityIssue {
            severity: Severity::Low,
            category: Category::Cost,
            title: "Unused Static IP Address".to_string(),
            description: format!("IP {} is reserved but not in use.", ip.ip_address),
            resource_name: ip.resource_name.clone(),
            project_id: ip.project_id.clone(),
            remediation: "Release the static IP if not needed to save costs.".to_string(),
        })
        .collect()
}
