//! Storage module for saving and loading visit flags
//!
//! This module provides save/load functionality using JSON serialization.

use crate::domain::repositories::FlagMap;

/// Save flags to bytes using JSON serialization
pub fn save(flags: &FlagMap) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_string_pretty(flags)?;
    Ok(json.into_bytes())
}

/// Load flags from bytes using JSON deserialization
pub fn load(bytes: &[u8]) -> anyhow::Result<FlagMap> {
    let json = std::str::from_utf8(bytes)?;
    if json.trim().is_empty() {
        return Ok(FlagMap::new());
    }
    let flags = serde_json::from_str(json)?;
    Ok(flags)
}
