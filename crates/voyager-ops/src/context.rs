//! OpsContext - a running viewer assembled from configuration.
//!
//! Owns the background tasks (store loop, render pipeline) and hands out the
//! [`Session`] that CLI and API talk to.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chooser::SchemaChooser;
use crate::config::Config;
use crate::dot::DotRenderer;
use crate::error::{OpsError, OpsResult};
use crate::fetch::{FetchOptions, IntrospectionClient};
use crate::parser::{SchemaParser, SchemaTextParser};
use crate::presets::Presets;
use crate::render::{GraphRenderer, RenderPipeline};
use crate::session::Session;
use crate::store::{Dispatcher, Store};

/// The main operations context.
#[derive(Debug)]
pub struct OpsContext {
    /// Configuration the context was started with.
    pub config: Config,
    session: Session,
    cancel: CancellationToken,
    store_task: JoinHandle<Store>,
    render_task: JoinHandle<()>,
}

impl OpsContext {
    /// Start with the DOT renderer and the JSON-or-SDL parser.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: Config) -> OpsResult<Self> {
        Self::start_with(
            config,
            Arc::new(DotRenderer),
            Arc::new(SchemaTextParser),
        )
    }

    pub fn start_with(
        config: Config,
        renderer: Arc<dyn GraphRenderer>,
        parser: Arc<dyn SchemaParser>,
    ) -> OpsResult<Self> {
        let presets = match &config.presets_path {
            Some(path) => Presets::load(path)?,
            None => Presets::new(),
        };
        let chooser = SchemaChooser::new(Arc::new(presets), parser);
        let client = IntrospectionClient::new(Duration::from_secs(config.timeout_secs))?;
        let fetch_options = FetchOptions {
            with_credentials: config.with_credentials,
            auth_token: config.auth_token.clone(),
        };

        let cancel = CancellationToken::new();
        let (dispatcher, store_task) = Dispatcher::spawn(Store::default(), cancel.child_token());
        let render_task = RenderPipeline::spawn(dispatcher.clone(), renderer, cancel.child_token());
        let session = Session::new(dispatcher, chooser, client, fetch_options);

        info!(
            presets = session.chooser().presets().len(),
            timeout_secs = config.timeout_secs,
            "Voyager context started"
        );

        Ok(Self {
            config,
            session,
            cancel,
            store_task,
            render_task,
        })
    }

    /// Start and run the configured bootstrap.
    pub async fn bootstrap(config: Config) -> OpsResult<Self> {
        let ctx = Self::start(config)?;
        ctx.session.bootstrap(&ctx.config.bootstrap_params()).await?;
        Ok(ctx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stop background tasks and return the final store.
    pub async fn shutdown(self) -> OpsResult<Store> {
        self.cancel.cancel();
        let _ = self.render_task.await;
        let store = self
            .store_task
            .await
            .map_err(|_| OpsError::DispatcherClosed)?;
        debug!(applied = store.applied(), "Voyager context stopped");
        Ok(store)
    }
}
