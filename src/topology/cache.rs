//! Reading topology snapshots written by the scanner.

use crate::config;
use crate::models::NetworkTopology;
use std::error::Error;
use std::path::Path;

/// Read a topology snapshot from a JSON file.
///
/// # Arguments
/// * `cache_file` - Optional path to a specific snapshot. If None, uses
///   [`config::DEFAULT_TOPOLOGY_FILE`].
///
/// # Returns
/// * `Ok(NetworkTopology)` - The parsed snapshot
/// * `Err` - If the file is missing or the JSON does not match the model
pub fn read_topology(cache_file: Option<&str>) -> Result<NetworkTopology, Box<dyn Error>> {
    let cache_file = cache_file.unwrap_or(config::DEFAULT_TOPOLOGY_FILE);

    if !Path::new(cache_file).exists() {
        return Err(format!("Topology file does not exist: {cache_file}").into());
    }
    log::info!("Reading topology from: {cache_file}");

    let json = std::fs::read_to_string(cache_file)
        .map_err(|e| format!("Error reading topology file {cache_file}: {e}"))?;
    let topology = parse_topology(&json)
        .map_err(|e| format!("Error parsing topology file {cache_file}: {e}"))?;

    log::info!(
        "Loaded scan '{}' with {} project(s), {} subnet(s)",
        topology.scan_id,
        topology.projects.len(),
        topology.subnet_count()
    );
    Ok(topology)
}

/// Parse snapshot JSON, reporting the path of the first mismatching field.
pub fn parse_topology(json: &str) -> Result<NetworkTopology, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let topology: NetworkTopology = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| format!("path={} error={}", e.path(), e))?;
    Ok(topology)
}
