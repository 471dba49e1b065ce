//! Replay command implementation.
//!
//! Runs a recorded event log through the reducer without any I/O besides
//! reading the log.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use voyager_core::Event;
use voyager_ops::Store;

/// Apply every event in `path` to a fresh store and print the final state.
pub fn execute(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let events: Vec<Event> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of events", path.display()))?;

    let mut store = Store::default();
    let mut changed = 0usize;
    for event in events {
        if store.dispatch(event) {
            changed += 1;
        }
    }
    info!(applied = store.applied(), changed, "Replay finished");

    println!("{}", serde_json::to_string_pretty(store.snapshot().as_ref())?);
    Ok(())
}
