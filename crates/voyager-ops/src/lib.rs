//! Voyager Operations Layer
//!
//! Everything around the pure reducer in `voyager-core`: the store loop, the
//! schema chooser, remote introspection, SDL parsing, presets and rendering. Both the CLI
//! and the HTTP API go through [`OpsContext`] and its [`Session`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use voyager_ops::{Config, OpsContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = OpsContext::bootstrap(Config::load()?).await?;
//!     let state = ctx
//!         .session()
//!         .wait_for_schema(std::time::Duration::from_secs(30))
//!         .await?;
//!
//!     println!("schema loaded: {}", state.has_schema());
//!     ctx.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod chooser;
mod config;
mod context;
mod dot;
mod error;
mod fetch;
mod parser;
mod presets;
mod render;
mod sdl;
mod session;
mod store;

// Re-export public API
pub use chooser::{ChooserStatus, SchemaChooser};
pub use config::{BootstrapParams, Config};
pub use context::OpsContext;
pub use dot::{render_dot, DotRenderer};
pub use error::{CommitBlocked, FetchError, OpsError, OpsResult};
pub use fetch::{FetchOptions, IntrospectionClient, RequestTokens};
pub use parser::{IntrospectionJsonParser, SchemaParser, SchemaTextParser};
pub use presets::Presets;
pub use render::{GraphRenderer, RenderPipeline};
pub use sdl::SdlParser;
pub use session::Session;
pub use store::{Dispatcher, Store};
