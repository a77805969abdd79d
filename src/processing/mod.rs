//! CIDR reasoning over values and topology snapshots.
//!
//! This module contains the planner's algorithms:
//! - [`overlap`] - Overlap classification and conflict detection
//! - [`free_blocks`] - Finding free blocks inside a scope
//! - [`planning`] - Conflict checks and IP plans against a topology
//! - [`ip_lookup`] - Address details, CIDR facts and utilization
//! - [`rule_match`] - Best-effort rule expression simulation
//! - [`security`] - Firewall exposure and unused address findings

mod free_blocks;
mod ip_lookup;
mod overlap;
mod planning;
mod rule_match;
mod security;

// Re-export public functions
pub use free_blocks::{find_free_blocks, find_free_blocks_capped};
pub use ip_lookup::{
    calculate_ip_utilization, cidr_info, find_suffix_ips, ip_details, CidrInfo, IpDetails,
    SuffixIp, Utilization,
};
pub use overlap::{
    classify_ranges, detect_conflicts, log_conflicts, overlap, ConflictRecord, OverlapKind,
};
pub use planning::{
    check_cidr, find_all_conflicts, plan_ip, suggest_available_cidrs, CidrCheckRequest,
    CidrCheckResponse, ConflictScope, IpPlanRequest, IpPlanResponse,
};
pub use rule_match::{extract_ip_literals, matches_input, matching_firewall_rules, simulate_policy};
pub use security::{
    analyze_firewalls, analyze_public_ips, analyze_security, Category, SecurityIssue,
    SecurityReport, SecuritySummary, Severity, RISKY_PORTS,
};
