//! Defaults and environment-driven settings.
//!
//! Environment variables may come from a `.env` file loaded by `main.rs`.

use crate::models::Cidr;
use std::env;

/// Search space used for suggestions when none is given (RFC1918 10/8).
pub const DEFAULT_BASE_CIDR: &str = "10.0.0.0/8";
/// Prefix length of suggested blocks.
pub const DEFAULT_PREFIX_LENGTH: u8 = 24;
/// Suggestions returned alongside a conflicting CIDR check.
pub const DEFAULT_SUGGESTION_COUNT: usize = 5;
/// Blocks returned by an IP plan.
pub const DEFAULT_PLAN_COUNT: usize = 10;
/// Upper bound on candidate slots examined by one free-block search.
pub const MAX_CANDIDATE_SCAN: u64 = 1 << 16;
/// Addresses GCP reserves in every primary subnet range.
pub const GCP_RESERVED_ADDRESSES: u64 = 4;
/// Snapshot file read when no path is given.
pub const DEFAULT_TOPOLOGY_FILE: &str = "topology_cache.json";

const ENV_TOPOLOGY_FILE: &str = "PLANNER_TOPOLOGY_FILE";
const ENV_BASE_CIDR: &str = "PLANNER_BASE_CIDR";
const ENV_SCAN_CAP: &str = "PLANNER_SCAN_CAP";

/// Runtime settings for the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub topology_file: String,
    pub base_cidr: Cidr,
    pub prefix_length: u8,
    pub suggestion_count: usize,
    pub plan_count: usize,
    pub scan_cap: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            topology_file: DEFAULT_TOPOLOGY_FILE.to_string(),
            base_cidr: default_base_cidr(),
            prefix_length: DEFAULT_PREFIX_LENGTH,
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
            plan_count: DEFAULT_PLAN_COUNT,
            scan_cap: MAX_CANDIDATE_SCAN,
        }
    }
}

fn default_base_cidr() -> Cidr {
    Cidr::parse(DEFAULT_BASE_CIDR).expect("DEFAULT_BASE_CIDR is a valid CIDR")
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup, falling back to defaults on bad values.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(file) = lookup(ENV_TOPOLOGY_FILE) {
            settings.topology_file = file;
        }

        if let Some(base) = lookup(ENV_BASE_CIDR) {
            match Cidr::parse(base.trim()) {
                Ok(cidr) => settings.base_cidr = cidr,
                Err(e) => log::warn!("Ignoring {ENV_BASE_CIDR}={base}: {e}"),
            }
        }

        if let Some(cap) = lookup(ENV_SCAN_CAP) {
            match cap.trim().parse::<u64>() {
                Ok(cap) if cap > 0 => settings.scan_cap = cap,
                _ => log::warn!("Ignoring {ENV_SCAN_CAP}={cap}: expected a positive integer"),
            }
        }

        log::debug!("Settings: {settings:?}");
        settings
    }
}
