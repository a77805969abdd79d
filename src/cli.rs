//! Command-line interface.
//!
//! Each command renders to a `String` so the dispatch can be tested without
//! capturing stdout.

use crate::config::{self, Settings};
use crate::load_topology;
use crate::models::{parse_ipv4, Cidr, CloudArmorRule};
use crate::output;
use crate::processing::{
    analyze_security, calculate_ip_utilization, check_cidr, cidr_info, extract_ip_literals,
    find_free_blocks_capped, find_suffix_ips, ip_details, matching_firewall_rules, overlap,
    plan_ip, simulate_policy, CidrCheckRequest, IpPlanRequest,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::error::Error;

/// Plan and check IPv4 ranges against a scanned GCP network topology.
#[derive(Parser, Debug)]
#[command(name = "gcp-network-planner", version, about)]
pub struct Cli {
    /// Topology snapshot (JSON) to read.
    #[arg(long, global = true)]
    pub topology: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a CIDR for conflicts with scanned subnets.
    CheckCidr {
        cidr: String,
        #[arg(long)]
        project: Option<String>,
        /// VPC self link.
        #[arg(long)]
        vpc: Option<String>,
    },
    /// Find free ranges avoiding a project and its peers.
    PlanIp {
        #[arg(long)]
        project: String,
        #[arg(long = "peer")]
        peers: Vec<String>,
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        mask: Option<u8>,
    },
    /// Find free blocks in a scope without a topology.
    FreeBlocks {
        scope: String,
        mask: u8,
        #[arg(long = "occupied")]
        occupied: Vec<String>,
        #[arg(long, default_value_t = config::DEFAULT_PLAN_COUNT)]
        limit: usize,
    },
    /// Show facts about a CIDR block.
    CidrInfo { cidr: String },
    /// Show where an internal IP lives and who uses it.
    CheckIp { ip: String },
    /// List free addresses with a given last octet.
    SuffixIps {
        suffix: u8,
        #[arg(long = "project")]
        projects: Vec<String>,
        #[arg(long = "vpc")]
        vpcs: Vec<String>,
    },
    /// Address usage of a VPC range.
    Utilization {
        #[arg(long)]
        project: String,
        #[arg(long)]
        vpc: String,
        #[arg(long)]
        cidr: String,
    },
    /// Find which Cloud Armor rule and firewall rules match an input.
    Simulate { policy: String, input: String },
    /// Report internet-exposed firewall rules and unused static IPs.
    Security,
    /// Check whether a CIDR contains an IP.
    Contains { cidr: String, ip: String },
    /// Classify how two CIDRs overlap.
    Overlap { a: String, b: String },
    /// List IP literals in a rule expression.
    Extract { expr: String },
}

#[derive(Serialize, Debug)]
struct SimulationReport<'a> {
    policy: &'a str,
    input: &'a str,
    matched_rule: Option<&'a CloudArmorRule>,
    firewall_rules: Vec<&'a str>,
}

/// Run a parsed command and return what should be printed.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<String, Box<dyn Error>> {
    let topology_path = cli.topology.as_deref();
    let json = cli.json;

    let rendered = match &cli.command {
        Command::CheckCidr { cidr, project, vpc } => {
            let topology = load_topology(topology_path, settings)?;
            let request = CidrCheckRequest {
                cidr: cidr.trim().to_string(),
                vpc_self_link: vpc.clone(),
                project_id: project.clone(),
            };
            let response = check_cidr(&request, &topology, settings)?;
            if json {
                output::render_json(&response)?
            } else {
                output::render_check(&response)
            }
        }
        Command::PlanIp {
            project,
            peers,
            base,
            mask,
        } => {
            let topology = load_topology(topology_path, settings)?;
            let request = IpPlanRequest {
                source_project_id: project.clone(),
                peer_projects: peers.clone(),
                base_cidr: base
                    .as_deref()
                    .map_or_else(|| settings.base_cidr.to_string(), |b| b.trim().to_string()),
                cidr_mask: mask.unwrap_or(settings.prefix_length),
            };
            let response = plan_ip(&request, &topology, settings)?;
            if json {
                output::render_json(&response)?
            } else {
                output::render_plan(&response)
            }
        }
        Command::FreeBlocks {
            scope,
            mask,
            occupied,
            limit,
        } => {
            let scope = Cidr::parse(scope.trim())?;
            let occupied = occupied
                .iter()
                .map(|c| Cidr::parse(c.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            let blocks = find_free_blocks_capped(&scope, *mask, &occupied, *limit, settings.scan_cap)?;
            if json {
                output::render_json(&blocks)?
            } else {
                output::render_blocks(&scope, *mask, &blocks)
            }
        }
        Command::CidrInfo { cidr } => {
            let info = cidr_info(&Cidr::parse(cidr.trim())?);
            if json {
                output::render_json(&info)?
            } else {
                output::render_cidr_info(&info)
            }
        }
        Command::CheckIp { ip } => {
            let topology = load_topology(topology_path, settings)?;
            let details = ip_details(ip.trim(), &topology)?;
            if json {
                output::render_json(&details)?
            } else {
                output::render_ip_details(&details)
            }
        }
        Command::SuffixIps {
            suffix,
            projects,
            vpcs,
        } => {
            let topology = load_topology(topology_path, settings)?;
            let ips = find_suffix_ips(*suffix, &topology, projects, vpcs);
            if json {
                output::render_json(&ips)?
            } else {
                output::render_suffix_ips(*suffix, &ips)
            }
        }
        Command::Utilization { project, vpc, cidr } => {
            let topology = load_topology(topology_path, settings)?;
            let vpc_cidr = Cidr::parse(cidr.trim())?;
            let network = topology
                .project(project)
                .and_then(|p| p.vpc_networks.iter().find(|v| &v.name == vpc))
                .ok_or_else(|| format!("VPC '{vpc}' not found in project '{project}'"))?;
            let util = calculate_ip_utilization(&vpc_cidr, &network.subnets);
            if json {
                output::render_json(&util)?
            } else {
                output::render_utilization(&util)
            }
        }
        Command::Simulate { policy, input } => {
            let topology = load_topology(topology_path, settings)?;
            let found = topology
                .cloud_armor_policies
                .iter()
                .find(|p| &p.name == policy)
                .ok_or_else(|| format!("Cloud Armor policy '{policy}' not found"))?;
            let rule = simulate_policy(found, input);
            let firewall = matching_firewall_rules(&topology.firewall_rules, input);
            if json {
                output::render_json(&SimulationReport {
                    policy,
                    input,
                    matched_rule: rule,
                    firewall_rules: firewall.iter().map(|r| r.name.as_str()).collect(),
                })?
            } else {
                output::render_simulation(policy, input, rule, &firewall)
            }
        }
        Command::Security => {
            let topology = load_topology(topology_path, settings)?;
            let report = analyze_security(&topology);
            if json {
                output::render_json(&report)?
            } else {
                output::render_security(&report)
            }
        }
        Command::Contains { cidr, ip } => {
            let block = Cidr::parse(cidr.trim())?;
            let address = parse_ipv4(ip.trim())?;
            let result = block.contains(address);
            if json {
                output::render_json(&serde_json::json!({ "cidr": block, "ip": address, "contains": result }))?
            } else {
                format!("{result}\n")
            }
        }
        Command::Overlap { a, b } => {
            let kind = overlap(&Cidr::parse(a.trim())?, &Cidr::parse(b.trim())?);
            if json {
                output::render_json(&kind)?
            } else {
                format!("{a} {} {b}\n", output::overlap_label(kind, 0))
            }
        }
        Command::Extract { expr } => {
            let literals = extract_ip_literals(expr);
            if json {
                output::render_json(&literals)?
            } else {
                literals.iter().map(|l| format!("{l}\n")).collect()
            }
        }
    };

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "src/tests/test_data/topology_test_01.json";

    fn run(args: &[&str]) -> Result<String, Box<dyn Error>> {
        colored::control::set_override(false);
        let cli = Cli::try_parse_from(std::iter::once("gcp-network-planner").chain(args.iter().copied()))?;
        execute(&cli, &Settings::default())
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_contains_and_overlap() {
        assert_eq!(run(&["contains", "192.168.1.0/24", "192.168.1.200"]).unwrap(), "true\n");
        assert_eq!(run(&["contains", "192.168.1.0/24", "192.168.2.1"]).unwrap(), "false\n");
        assert!(run(&["contains", "192.168.1.0", "192.168.2.1"]).is_err());
        assert_eq!(run(&["contains", " 192.168.1.0/24", "192.168.1.7 "]).unwrap(), "true\n");
        assert_eq!(
            run(&["overlap", "10.0.0.0/8", "10.1.0.0/16"]).unwrap(),
            "10.0.0.0/8 contains 10.1.0.0/16\n"
        );
    }

    #[test]
    fn test_free_blocks_json() {
        let out = run(&["--json", "free-blocks", "10.0.0.0/24", "24", "--occupied", "10.0.0.0/24"]).unwrap();
        assert_eq!(out, "[]");
        let out = run(&["free-blocks", "10.0.0.0/8", "24", "--limit", "2"]).unwrap();
        assert!(out.contains("10.0.0.0/24") && out.contains("10.0.1.0/24"));
    }

    #[test]
    fn test_extract() {
        let out = run(&["extract", "inIpRange(origin.ip, '1.2.3.0/24') && origin.ip == '5.6.7.8'"]).unwrap();
        assert_eq!(out, "1.2.3.0/24\n5.6.7.8\n");
    }

    #[test]
    fn test_topology_commands() {
        let out = run(&["--topology", FIXTURE, "check-cidr", "10.10.16.0/24"]).unwrap();
        assert!(out.contains("1 conflict(s)"), "{out}");
        assert!(out.contains("db-euw1"));

        let out = run(&["--topology", FIXTURE, "simulate", "edge-policy", "203.0.113.10"]).unwrap();
        assert!(out.contains("priority 900"), "{out}");

        assert!(run(&["--topology", FIXTURE, "simulate", "missing", "1.1.1.1"]).is_err());

        let out = run(&["--topology", FIXTURE, "security"]).unwrap();
        assert!(out.starts_with("3 issue(s): 0 critical, 1 high, 1 medium, 1 low"), "{out}");
        let out = run(&["--json", "--topology", FIXTURE, "security"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["summary"]["by_category"]["COST"], 1);
        assert!(run(&["--topology", FIXTURE, "utilization", "--project", "app-prj", "--vpc", "nope", "--cidr", "10.20.0.0/16"]).is_err());
    }
}
