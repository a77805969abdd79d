//! CIDR conflict checks and IP planning against a topology snapshot.
//!
//! Both operations are authoritative: malformed ranges in the snapshot
//! surface as errors instead of being skipped.

use super::free_blocks::find_free_blocks_capped;
use super::overlap::{detect_conflicts, log_conflicts, ConflictRecord};
use crate::config::Settings;
use crate::models::{Cidr, CidrError, NetworkTopology, SubnetRef};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Restricts a conflict check to one project and/or one VPC.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConflictScope {
    pub project_id: Option<String>,
    pub vpc_self_link: Option<String>,
}

impl ConflictScope {
    fn includes(&self, owner: &SubnetRef) -> bool {
        self.project_id
            .as_deref()
            .map_or(true, |p| owner.project_id == p)
            && self
                .vpc_self_link
                .as_deref()
                .map_or(true, |v| owner.vpc_self_link == v)
    }
}

/// Request to check a CIDR for conflicts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CidrCheckRequest {
    pub cidr: String,
    #[serde(default)]
    pub vpc_self_link: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Result of a conflict check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CidrCheckResponse {
    pub input_cidr: String,
    pub has_conflict: bool,
    pub conflicts: Vec<ConflictRecord<SubnetRef>>,
    pub suggested_cidrs: Vec<Cidr>,
}

/// Request to plan a range for a new subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IpPlanRequest {
    pub source_project_id: String,
    #[serde(default)]
    pub peer_projects: Vec<String>,
    pub base_cidr: String,
    pub cidr_mask: u8,
}

/// Result of an IP plan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IpPlanResponse {
    pub available_cidrs: Vec<Cidr>,
    pub checked_scope: Vec<String>,
}

/// Find every subnet range in `topology` that overlaps `input`.
pub fn find_all_conflicts(
    input: &Cidr,
    topology: &NetworkTopology,
    scope: &ConflictScope,
) -> Result<Vec<ConflictRecord<SubnetRef>>, CidrError> {
    let candidates = topology
        .subnet_refs()
        .into_iter()
        .filter(|(_, owner)| scope.includes(owner));
    detect_conflicts(input, candidates)
}

/// Parse every range in `topology` (optionally limited to some projects).
fn occupied_ranges(
    topology: &NetworkTopology,
    projects: Option<&[String]>,
) -> Result<Vec<Cidr>, CidrError> {
    topology
        .subnet_refs()
        .into_iter()
        .filter(|(_, owner)| projects.map_or(true, |p| p.contains(&owner.project_id)))
        .map(|(cidr, _)| Cidr::parse(cidr))
        .collect()
}

/// Suggest free blocks inside `base` that avoid every range in `topology`.
pub fn suggest_available_cidrs(
    base: &Cidr,
    topology: &NetworkTopology,
    prefix_length: u8,
    count: usize,
    settings: &Settings,
) -> Result<Vec<Cidr>, CidrError> {
    let occupied = occupied_ranges(topology, None)?;
    find_free_blocks_capped(base, prefix_length, &occupied, count, settings.scan_cap)
}

/// Check a CIDR against the snapshot and suggest alternatives on conflict.
pub fn check_cidr(
    request: &CidrCheckRequest,
    topology: &NetworkTopology,
    settings: &Settings,
) -> Result<CidrCheckResponse, CidrError> {
    let input = Cidr::parse(&request.cidr)?;
    let scope = ConflictScope {
        project_id: request.project_id.clone(),
        vpc_self_link: request.vpc_self_link.clone(),
    };

    let conflicts = find_all_conflicts(&input, topology, &scope)?;
    log_conflicts(&input, &conflicts);

    let suggested_cidrs = if conflicts.is_empty() {
        Vec::new()
    } else {
        suggest_available_cidrs(
            &settings.base_cidr,
            topology,
            settings.prefix_length,
            settings.suggestion_count,
            settings,
        )?
    };

    Ok(CidrCheckResponse {
        input_cidr: request.cidr.clone(),
        has_conflict: !conflicts.is_empty(),
        conflicts,
        suggested_cidrs,
    })
}

/// Plan free ranges that avoid the source project and all peer projects.
pub fn plan_ip(
    request: &IpPlanRequest,
    topology: &NetworkTopology,
    settings: &Settings,
) -> Result<IpPlanResponse, CidrError> {
    let base = Cidr::parse(&request.base_cidr)?;

    let checked_scope: Vec<String> = std::iter::once(&request.source_project_id)
        .chain(request.peer_projects.iter())
        .cloned()
        .sorted()
        .dedup()
        .collect();

    for project_id in &checked_scope {
        if topology.project(project_id).is_none() {
            log::warn!("Project '{project_id}' is not in the topology snapshot");
        }
    }

    let occupied = occupied_ranges(topology, Some(&checked_scope))?;
    log::info!(
        "Planning /{} in {base}: {} occupied range(s) across {}",
        request.cidr_mask,
        occupied.len(),
        checked_scope.join(",")
    );

    let available_cidrs = find_free_blocks_capped(
        &base,
        request.cidr_mask,
        &occupied,
        settings.plan_count,
        settings.scan_cap,
    )?;

    Ok(IpPlanResponse {
        available_cidrs,
        checked_scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, SecondaryRange, Subnet, VpcNetwork};
    use crate::processing::OverlapKind;

    fn subnet(name: &str, cidr: &str) -> Subnet {
        Subnet {
            name: name.to_string(),
            region: "us-central1".to_string(),
            ip_cidr_range: cidr.to_string(),
            ..Default::default()
        }
    }

    fn project(id: &str, vpc: &str, subnets: Vec<Subnet>) -> Project {
        Project {
            project_id: id.to_string(),
            vpc_networks: vec![VpcNetwork {
                name: vpc.to_string(),
                self_link: format!("projects/{id}/global/networks/{vpc}"),
                project_id: id.to_string(),
                subnets,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn topology() -> NetworkTopology {
        let mut gke = subnet("gke", "10.0.1.0/24");
        gke.secondary_ip_ranges = vec![SecondaryRange {
            range_name: Some("pods".to_string()),
            ip_cidr_range: "10.4.0.0/14".to_string(),
        }];
        NetworkTopology {
            scan_id: "t".to_string(),
            projects: vec![
                project("alpha", "main", vec![subnet("web", "10.0.0.0/24"), gke]),
                project("beta", "edge", vec![subnet("dmz", "10.0.2.0/23")]),
                project("gamma", "lab", vec![subnet("lab", "10.0.8.0/24")]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_find_all_conflicts() {
        let input = Cidr::parse("10.0.0.0/22").unwrap();
        let conflicts = find_all_conflicts(&input, &topology(), &ConflictScope::default()).unwrap();
        let found: Vec<(String, &str, OverlapKind)> = conflicts
            .iter()
            .map(|c| (c.conflicting_cidr.to_string(), c.meta.subnet_name.as_str(), c.overlap_type))
            .collect();
        assert_eq!(
            found,
            vec![
                ("10.0.0.0/24".to_string(), "web", OverlapKind::Contains),
                ("10.0.1.0/24".to_string(), "gke", OverlapKind::Contains),
                ("10.0.2.0/23".to_string(), "dmz", OverlapKind::Contains),
            ]
        );
    }

    #[test]
    fn test_find_all_conflicts_secondary_and_scope() {
        let input = Cidr::parse("10.5.0.0/16").unwrap();
        let scope = ConflictScope {
            project_id: Some("alpha".to_string()),
            vpc_self_link: None,
        };
        let conflicts = find_all_conflicts(&input, &topology(), &scope).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].meta.subnet_name, "gke:pods");
        assert_eq!(conflicts[0].overlap_type, OverlapKind::ContainedBy);

        let scope = ConflictScope {
            project_id: Some("beta".to_string()),
            vpc_self_link: None,
        };
        assert!(find_all_conflicts(&input, &topology(), &scope).unwrap().is_empty());
    }

    #[test]
    fn test_check_cidr_suggests_on_conflict() {
        let settings = Settings::default();
        let request = CidrCheckRequest {
            cidr: "10.0.0.0/24".to_string(),
            vpc_self_link: None,
            project_id: None,
        };
        let response = check_cidr(&request, &topology(), &settings).unwrap();
        assert!(response.has_conflict);
        assert_eq!(response.conflicts[0].overlap_type, OverlapKind::Equal);
        let suggested: Vec<String> = response.suggested_cidrs.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            suggested,
            ["10.0.4.0/24", "10.0.5.0/24", "10.0.6.0/24", "10.0.7.0/24", "10.0.9.0/24"]
        );
    }

    #[test]
    fn test_check_cidr_without_conflict() {
        let request = CidrCheckRequest {
            cidr: "192.168.0.0/16".to_string(),
            vpc_self_link: None,
            project_id: None,
        };
        let response = check_cidr(&request, &topology(), &Settings::default()).unwrap();
        assert!(!response.has_conflict);
        assert!(response.conflicts.is_empty());
        assert!(response.suggested_cidrs.is_empty());
    }

    #[test]
    fn test_check_cidr_fails_loud() {
        let mut topology = topology();
        topology.projects[2].vpc_networks[0].subnets[0].ip_cidr_range = "10.0.8.0/99".to_string();
        let request = CidrCheckRequest {
            cidr: "10.0.0.0/24".to_string(),
            vpc_self_link: None,
            project_id: None,
        };
        assert!(check_cidr(&request, &topology, &Settings::default()).is_err());

        let bad_input = CidrCheckRequest {
            cidr: "10.0.0.0".to_string(),
            vpc_self_link: None,
            project_id: None,
        };
        assert!(matches!(
            check_cidr(&bad_input, &topology, &Settings::default()),
            Err(CidrError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_plan_ip_scopes_to_projects() {
        let request = IpPlanRequest {
            source_project_id: "beta".to_string(),
            peer_projects: vec!["alpha".to_string(), "beta".to_string()],
            base_cidr: "10.0.0.0/20".to_string(),
            cidr_mask: 24,
        };
        let response = plan_ip(&request, &topology(), &Settings::default()).unwrap();
        assert_eq!(response.checked_scope, ["alpha", "beta"]);
        let available: Vec<String> = response.available_cidrs.iter().map(|c| c.to_string()).collect();
        // gamma's 10.0.8.0/24 is not in scope, so it stays available
        assert_eq!(
            available,
            [
                "10.0.4.0/24", "10.0.5.0/24", "10.0.6.0/24", "10.0.7.0/24", "10.0.8.0/24",
                "10.0.9.0/24", "10.0.10.0/24", "10.0.11.0/24", "10.0.12.0/24", "10.0.13.0/24"
            ]
        );
    }

    #[test]
    fn test_plan_ip_rejects_oversized_mask() {
        let request = IpPlanRequest {
            source_project_id: "alpha".to_string(),
            peer_projects: vec![],
            base_cidr: "10.0.0.0/16".to_string(),
            cidr_mask: 12,
        };
        assert!(matches!(
            plan_ip(&request, &topology(), &Settings::default()),
            Err(CidrError::InvalidRequest(_))
        ));
    }
}
