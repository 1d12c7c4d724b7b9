//! Output formatting and delivery of snapshots.
//!
//! Supports pretty-printing summaries, JSON serialization, and writing the
//! latest snapshot to a file for an external server to pick up.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::model::UnifiedSnapshot;
use crate::summary::SnapshotSummary;
use std::fs;
use std::path::Path;

/// Logs the per-cycle counts (buses, rail, delayed, alerts, ION status) at debug level.
pub fn print_pretty(summary: &SnapshotSummary) {
    debug!("{:#?}", summary);
}

/// Serializes a snapshot in the client JSON shape.
pub fn to_json(snapshot: &UnifiedSnapshot, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    Ok(json)
}

/// Logs the per-cycle counts at info level, as the JSON a poller sees each cycle.
pub fn print_json(summary: &SnapshotSummary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Replaces the file at `path` with the snapshot JSON.
///
/// The JSON is written to a sibling temporary file first and renamed into
/// place, so readers never observe a half-written snapshot.
pub fn write_snapshot(path: &str, snapshot: &UnifiedSnapshot) -> Result<()> {
    let target = Path::new(path);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = target.with_extension("json.tmp");
    fs::write(&tmp, to_json(snapshot, false)?)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, target).with_context(|| format!("Failed to replace {path}"))?;

    debug!(path, vehicles = snapshot.vehicles.len(), "Snapshot written");
    Ok(())
}
