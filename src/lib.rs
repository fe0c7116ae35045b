use crate::device::device_model::Snapshot;

pub mod action;
pub mod agent;
pub mod cli;
pub mod device;
pub mod screen;
pub mod state;
pub mod trace;

/// Read one snapshot from a JSON file produced by the device driver.
pub fn load_snapshot(path: &str) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    Ok(snapshot)
}
