//! Render command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use voyager_core::Event;
use voyager_ops::Config;

use super::{load_context, wait_for_render, DisplayArgs, SourceArgs};

/// Load a schema, render it with the given options and write the DOT text.
pub async fn execute(
    config: &Config,
    source: &SourceArgs,
    display: &DisplayArgs,
    output: Option<&Path>,
) -> Result<()> {
    let ctx = load_context(config, source).await?;

    let patch = display.patch();
    if !patch.is_empty() {
        ctx.session()
            .dispatcher()
            .apply(Event::DisplayOptionsChanged(patch))
            .await?;
    }

    let state = wait_for_render(&ctx, Duration::from_secs(ctx.config.timeout_secs)).await?;
    let dot = state
        .graph_view
        .rendered_image
        .as_ref()
        .map(|image| image.as_str().to_string())
        .unwrap_or_default();

    match output {
        Some(path) => {
            std::fs::write(path, &dot)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = dot.len(), "Graph written");
            println!("✅ Graph written to {}", path.display());
        }
        None => print!("{}", dot),
    }

    ctx.shutdown().await?;
    Ok(())
}
