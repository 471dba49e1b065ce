//! CLI command implementations.

pub mod config;
pub mod load;
pub mod presets;
pub mod render;
pub mod replay;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use voyager_core::{ApplicationState, DisplayOptionsPatch, NodeId};
use voyager_ops::{Config, OpsContext};

/// Where the schema comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// GraphQL endpoint to introspect.
    #[arg(long, conflicts_with_all = ["preset", "file"])]
    pub url: Option<String>,

    /// Send credentials (VOYAGER_AUTH_TOKEN) with the introspection request.
    #[arg(long, requires = "url")]
    pub with_credentials: bool,

    /// Preset to apply.
    #[arg(long, conflicts_with = "file")]
    pub preset: Option<String>,

    /// Presets file or directory (overrides config).
    #[arg(long)]
    pub presets: Option<PathBuf>,

    /// Introspection JSON file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl SourceArgs {
    /// Config with these flags applied on top.
    ///
    /// An explicit source on the command line replaces the configured one.
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(path) = &self.presets {
            config.presets_path = Some(path.clone());
        }
        if self.url.is_some() || self.preset.is_some() || self.file.is_some() {
            config.endpoint = self.url.clone();
            config.preset = self.preset.clone();
            config.with_credentials = self.with_credentials;
        }
        config
    }
}

/// Display options for rendering.
#[derive(Args, Debug, Clone, Default)]
pub struct DisplayArgs {
    /// Type to use as the graph root (defaults to the query type).
    #[arg(long)]
    pub root: Option<String>,

    /// Draw relay connection, edge and page info types.
    #[arg(long)]
    pub no_skip_relay: bool,

    /// Sort fields alphabetically.
    #[arg(long)]
    pub sort: bool,

    /// Hide scalar and enum fields.
    #[arg(long)]
    pub hide_leaves: bool,

    /// Do not draw the root type.
    #[arg(long)]
    pub hide_root: bool,
}

impl DisplayArgs {
    pub fn patch(&self) -> DisplayOptionsPatch {
        let mut patch = DisplayOptionsPatch::default();
        if let Some(root) = &self.root {
            patch = patch.root_type(Some(NodeId::for_type(root)));
        }
        if self.no_skip_relay {
            patch = patch.skip_relay(false);
        }
        if self.sort {
            patch = patch.sort_by_alphabet(true);
        }
        if self.hide_leaves {
            patch = patch.show_leaf_fields(false);
        }
        if self.hide_root {
            patch = patch.hide_root(true);
        }
        patch
    }
}

/// Start a context and bring in a schema from `source`.
pub async fn load_context(config: &Config, source: &SourceArgs) -> Result<OpsContext> {
    let config = source.apply(config);
    let timeout = Duration::from_secs(config.timeout_secs);
    let ctx = OpsContext::start(config)?;
    let session = ctx.session();

    if let Some(file) = &source.file {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        session.stage_text(&text).await?;
        session.commit().await?;
    } else {
        session.bootstrap(&ctx.config.bootstrap_params()).await?;
    }

    let state = session.wait_for_schema(timeout).await?;
    if !state.has_schema() {
        let reason = state
            .error_message
            .clone()
            .unwrap_or_else(|| "no schema source, pass --url, --preset or --file".to_string());
        ctx.shutdown().await?;
        anyhow::bail!(reason);
    }

    debug!(types = ?state.schema.as_ref().map(|s| s.types().len()), "Schema loaded");
    Ok(ctx)
}

/// Wait until the current view has been rendered.
pub async fn wait_for_render(ctx: &OpsContext, timeout: Duration) -> Result<Arc<ApplicationState>> {
    let mut rx = ctx.session().dispatcher().subscribe();
    let wait = async {
        loop {
            let state = Arc::clone(&rx.borrow_and_update());
            if state.graph_view.rendered_image.is_some() {
                return Ok::<_, anyhow::Error>(state);
            }
            if let Some(message) = &state.error_message {
                anyhow::bail!("Render failed: {}", message);
            }
            rx.changed().await?;
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .context("Timed out waiting for the renderer")?
}
