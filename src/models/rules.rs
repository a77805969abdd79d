//! Firewall rules and Cloud Armor security policies.

use serde::{Deserialize, Serialize};

/// Priority Cloud Armor assigns to the catch-all default rule.
pub const DEFAULT_RULE_PRIORITY: i64 = 2_147_483_647;

/// Protocol and ports a firewall rule allows or denies.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FirewallPermission {
    /// "tcp", "udp", "icmp", "all", ...
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    /// Single ports ("22") or ranges ("8000-8080"); empty means every port.
    #[serde(default)]
    pub ports: Vec<String>,
}

/// VPC firewall rule.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FirewallRule {
    pub name: String,
    /// "INGRESS" or "EGRESS".
    #[serde(default)]
    pub direction: String,
    /// "ALLOW" or "DENY".
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub source_ranges: Vec<String>,
    #[serde(default)]
    pub destination_ranges: Vec<String>,
    #[serde(default)]
    pub allowed: Vec<FirewallPermission>,
    #[serde(default)]
    pub denied: Vec<FirewallPermission>,
    #[serde(default)]
    pub vpc_network: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub disabled: bool,
}

/// One rule of a Cloud Armor policy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CloudArmorRule {
    pub priority: i64,
    /// e.g. "allow", "deny(403)", "throttle".
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Matching expression in the Cloud Armor rules language.
    #[serde(default)]
    pub match_expression: Option<String>,
    #[serde(default)]
    pub preview: bool,
}

impl CloudArmorRule {
    /// The rule evaluated last when nothing else matched.
    pub fn is_default(&self) -> bool {
        self.priority == DEFAULT_RULE_PRIORITY
    }
}

/// Cloud Armor security policy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CloudArmorPolicy {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<CloudArmorRule>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub self_link: String,
}
