//! Domain models for the network planner.
//!
//! This module contains the value types used throughout the crate:
//! - [`Cidr`] - IPv4 block with CIDR notation support, plus the address codec
//! - [`CidrError`] - Typed parse and request errors
//! - [`NetworkTopology`] - Scanned projects, VPCs and subnets
//! - [`FirewallRule`] and [`CloudArmorPolicy`] - Rule objects for simulation

mod error;
mod ipv4;
mod rules;
mod topology;

// Re-export public types
pub use error::CidrError;
pub use ipv4::{format_ipv4, parse_ipv4, Cidr, MAX_LENGTH};
pub use rules::{
    CloudArmorPolicy, CloudArmorRule, FirewallPermission, FirewallRule, DEFAULT_RULE_PRIORITY,
};
pub use topology::{
    NetworkTopology, Project, PublicIp, SecondaryRange, Subnet, SubnetRef, UsedInternalIp,
    VpcNetwork,
};
