//! Human-readable and JSON rendering of planner results.

use super::terminal::{flag, format_field, overlap_label};
use crate::models::{Cidr, CloudArmorRule, FirewallRule};
use crate::processing::{
    CidrCheckResponse, CidrInfo, IpDetails, IpPlanResponse, SecurityReport, Severity, SuffixIp,
    Utilization,
};
use colored::{ColoredString, Colorize};
use itertools::Itertools;
use serde::Serialize;
use std::error::Error;

/// Pretty JSON for `--json` output.
pub fn render_json<T: Serialize>(value: &T) -> Result<String, Box<dyn Error>> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Error serializing JSON: {e}").into())
}

fn render_cidr_list(title: &str, cidrs: &[Cidr]) -> String {
    if cidrs.is_empty() {
        return format!("{title}: {}\n", "none".yellow());
    }
    let mut out = format!("{title}:\n");
    for cidr in cidrs {
        out.push_str(&format!("  {cidr}\n"));
    }
    out
}

/// Render a conflict check.
pub fn render_check(response: &CidrCheckResponse) -> String {
    let status = if response.has_conflict {
        format!("{} conflict(s)", response.conflicts.len()).red().bold()
    } else {
        "no conflicts".green().bold()
    };
    let mut out = format!("CIDR {}: {status}\n", response.input_cidr.bold());

    for conflict in &response.conflicts {
        out.push_str(&format!(
            "  {} {} {} {} {} {}\n",
            format_field(&conflict.conflicting_cidr, 18),
            overlap_label(conflict.overlap_type, 12),
            format_field(&conflict.meta.subnet_name, 24),
            format_field(&conflict.meta.vpc_name, 20),
            format_field(&conflict.meta.project_id, 24),
            conflict.meta.region
        ));
    }

    if response.has_conflict {
        out.push_str(&render_cidr_list("Suggested", &response.suggested_cidrs));
    }
    out
}

/// Render an IP plan.
pub fn render_plan(response: &IpPlanResponse) -> String {
    format!(
        "Checked projects: {}\n{}",
        response.checked_scope.join(", "),
        render_cidr_list("Available", &response.available_cidrs)
    )
}

/// Render a free-block search.
pub fn render_blocks(scope: &Cidr, prefix: u8, blocks: &[Cidr]) -> String {
    render_cidr_list(&format!("Free /{prefix} blocks in {scope}"), blocks)
}

/// Render CIDR facts.
pub fn render_cidr_info(info: &CidrInfo) -> String {
    let optional = |ip: Option<std::net::Ipv4Addr>| ip.map_or_else(|| "-".to_string(), |ip| ip.to_string());
    let rows = [
        ("cidr", info.cidr.clone()),
        ("network", info.network_address.to_string()),
        ("broadcast", info.broadcast_address.to_string()),
        ("netmask", info.netmask.to_string()),
        ("prefix", format!("/{}", info.prefix_length)),
        ("total", info.total_hosts.to_string()),
        ("usable", info.usable_hosts.to_string()),
        ("first usable", optional(info.first_usable)),
        ("last usable", optional(info.last_usable)),
        ("private", flag(info.is_private).to_string()),
    ];
    rows.iter()
        .map(|(k, v)| format!("{} {v}\n", format_field(k, 14)))
        .collect()
}

/// Render an address lookup.
pub fn render_ip_details(details: &IpDetails) -> String {
    let mut out = format!(
        "IP {}: used {}\n",
        details.ip_address.to_string().bold(),
        flag(details.is_used)
    );
    if let Some(used_by) = &details.used_by {
        out.push_str(&format!(
            "  used by {} '{}' in {}\n",
            used_by.resource_type, used_by.resource_name, used_by.project_id
        ));
    }
    match (&details.subnet, &details.vpc, &details.project) {
        (Some(subnet), Some(vpc), Some(project)) => out.push_str(&format!(
            "  subnet {} ({}) in VPC {vpc}, project {project}, region {}\n",
            subnet.name, subnet.ip_cidr_range, subnet.region
        )),
        _ => out.push_str(&format!("  {}\n", "not inside any scanned subnet".yellow())),
    }
    out
}

/// Render suffix search results.
pub fn render_suffix_ips(suffix: u8, ips: &[SuffixIp]) -> String {
    let mut out = format!("{} free address(es) ending in .{suffix}\n", ips.len());
    for ip in ips {
        out.push_str(&format!(
            "  {} {} {} {} {}\n",
            format_field(ip.ip_address, 16),
            format_field(&ip.subnet, 24),
            format_field(&ip.vpc, 20),
            format_field(&ip.project, 24),
            ip.region
        ));
    }
    out
}

/// Render VPC utilization.
pub fn render_utilization(util: &Utilization) -> String {
    let percent = format!("{:.2}%", util.utilization_percent);
    let percent = if util.utilization_percent >= 80.0 {
        percent.red()
    } else {
        percent.green()
    };
    format!(
        "{}: {} of {} addresses used by {} subnet(s) ({percent}), {} available\n",
        util.vpc_cidr, util.used_ips, util.total_ips, util.subnet_count, util.available_ips
    )
}

/// Render the outcome of a rule simulation.
pub fn render_simulation(
    policy: &str,
    input: &str,
    rule: Option<&CloudArmorRule>,
    firewall_rules: &[&FirewallRule],
) -> String {
    let mut out = match rule {
        Some(rule) => format!(
            "Policy {policy}: '{input}' hits priority {} -> {}{}\n",
            rule.priority,
            rule.action.bold(),
            rule.description
                .as_deref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default()
        ),
        None => format!("Policy {policy}: no rule matches '{input}'\n"),
    };
    if !firewall_rules.is_empty() {
        let names = firewall_rules
            .iter()
            .map(|r| format!("{}[{}:{}]", r.name, r.priority, r.action))
            .join(", ");
        out.push_str(&format!("Firewall source ranges matching: {names}\n"));
    }
    out
}

fn severity_label(severity: Severity) -> ColoredString {
    let text = format_field(format!("{severity:?}").to_uppercase(), 9);
    match severity {
        Severity::Critical => text.as_str().red().bold(),
        Severity::High => text.as_str().red(),
        Severity::Medium => text.as_str().yellow(),
        Severity::Low => text.as_str().normal(),
    }
}

/// Render security findings, most severe first.
pub fn render_security(report: &SecurityReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "{} issue(s): {} critical, {} high, {} medium, {} low\n",
        summary.total, summary.critical, summary.high, summary.medium, summary.low
    );
    for issue in report.issues.iter().sorted_by_key(|i| i.severity) {
        out.push_str(&format!(
            "  {} {} {} ({})\n",
            severity_label(issue.severity),
            format_field(format!("{:?}", issue.category).to_uppercase(), 9),
            issue.title,
            issue.resource_name
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubnetRef;
    use crate::processing::{Category, ConflictRecord, OverlapKind, SecurityIssue, SecuritySummary};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_render_check() {
        plain();
        let response = CidrCheckResponse {
            input_cidr: "10.0.0.0/24".to_string(),
            has_conflict: true,
            conflicts: vec![ConflictRecord {
                conflicting_cidr: Cidr::parse("10.0.0.0/16").unwrap(),
                overlap_type: OverlapKind::ContainedBy,
                meta: SubnetRef {
                    subnet_name: "core".to_string(),
                    vpc_name: "vpc".to_string(),
                    vpc_self_link: String::new(),
                    project_id: "p".to_string(),
                    region: "us-east1".to_string(),
                },
            }],
            suggested_cidrs: vec![Cidr::parse("10.1.0.0/24").unwrap()],
        };
        let text = render_check(&response);
        assert!(text.starts_with("CIDR 10.0.0.0/24: 1 conflict(s)"));
        assert!(text.contains("contained_by"));
        assert!(text.contains("  10.1.0.0/24\n"));
    }

    #[test]
    fn test_render_json_uses_wire_names() {
        let response = IpPlanResponse {
            available_cidrs: vec![Cidr::parse("10.9.0.0/24").unwrap()],
            checked_scope: vec!["a".to_string()],
        };
        let json = render_json(&response).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["available_cidrs"][0], "10.9.0.0/24");
        assert_eq!(value["checked_scope"][0], "a");
    }

    #[test]
    fn test_render_simulation_without_match() {
        plain();
        let text = render_simulation("edge", "1.1.1.1", None, &[]);
        assert_eq!(text, "Policy edge: no rule matches '1.1.1.1'\n");
    }

    #[test]
    fn test_render_security_orders_by_severity() {
        plain();
        let issue = |severity: Severity, title: &str| SecurityIssue {
            severity,
            category: Category::Firewall,
            title: title.to_string(),
            description: String::new(),
            resource_name: "fw".to_string(),
            project_id: "p".to_string(),
            remediation: String::new(),
        };
        let report = SecurityReport {
            issues: vec![issue(Severity::Low, "later"), issue(Severity::Critical, "first")],
            generated_at: chrono::Utc::now(),
            summary: SecuritySummary {
                critical: 1,
                low: 1,
                total: 2,
                ..Default::default()
            },
        };
        let text = render_security(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 issue(s): 1 critical, 0 high, 0 medium, 1 low");
        assert_eq!(lines[1], "  CRITICAL  FIREWALL  first (fw)");
        assert_eq!(lines[2], "  LOW       FIREWALL  later (fw)");
    }
}
