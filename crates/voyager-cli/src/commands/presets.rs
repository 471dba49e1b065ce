//! Presets command implementation.

use std::path::Path;

use anyhow::Result;
use voyager_ops::{Config, Presets};

/// List the preset names available for `--preset`.
pub fn execute(config: &Config, path: Option<&Path>) -> Result<()> {
    let Some(path) = path.or(config.presets_path.as_deref()) else {
        println!("(no presets configured, set VOYAGER_PRESETS or pass --presets)");
        return Ok(());
    };

    let presets = Presets::load(path)?;
    if presets.is_empty() {
        println!("(no presets in {})", path.display());
        return Ok(());
    }

    for name in presets.names() {
        println!("{}", name);
    }
    Ok(())
}
