//! One running viewer: store handle, chooser, and remote loading.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use voyager_core::{ApplicationState, Event, RequestToken};

use crate::chooser::{ChooserStatus, SchemaChooser};
use crate::config::BootstrapParams;
use crate::error::{FetchError, OpsError, OpsResult};
use crate::fetch::{FetchOptions, IntrospectionClient, RequestTokens};
use crate::store::Dispatcher;

/// Glue between the store and everything that feeds it.
///
/// Cloning is cheap; clones share the dialog flag and token counter.
#[derive(Debug, Clone)]
pub struct Session {
    dispatcher: Dispatcher,
    chooser: SchemaChooser,
    client: IntrospectionClient,
    fetch_options: FetchOptions,
    tokens: Arc<RequestTokens>,
    dialog_open: Arc<AtomicBool>,
}

impl Session {
    /// New session with the chooser dialog open.
    pub fn new(
        dispatcher: Dispatcher,
        chooser: SchemaChooser,
        client: IntrospectionClient,
        fetch_options: FetchOptions,
    ) -> Self {
        Self {
            dispatcher,
            chooser,
            client,
            fetch_options,
            tokens: Arc::new(RequestTokens::new()),
            dialog_open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn chooser(&self) -> &SchemaChooser {
        &self.chooser
    }

    pub fn snapshot(&self) -> Arc<ApplicationState> {
        self.dispatcher.snapshot()
    }

    /// Decide how the first schema arrives.
    ///
    /// An endpoint wins over a preset. With neither the dialog stays open.
    pub async fn bootstrap(&self, params: &BootstrapParams) -> OpsResult<()> {
        if let Some(endpoint) = &params.endpoint {
            info!(%endpoint, "Bootstrapping from endpoint");
            self.dialog_open.store(false, Ordering::SeqCst);
            self.fetch_schema(endpoint, params.with_credentials).await?;
            return Ok(());
        }

        if let Some(preset) = &params.preset {
            if self.chooser.presets().is_empty() {
                return Err(OpsError::configuration(format!(
                    "preset `{}` requested but no presets are configured",
                    preset
                )));
            }
            info!(%preset, "Bootstrapping from preset");
            self.dialog_open.store(false, Ordering::SeqCst);
            self.stage_preset(preset).await?;
            self.commit().await?;
            return Ok(());
        }

        debug!("No bootstrap source, waiting for the chooser");
        Ok(())
    }

    /// Start loading a schema from `endpoint`.
    ///
    /// Returns once the request is registered with the store. The result
    /// arrives later as `SchemaFetched` or `SchemaFetchFailed`; a newer
    /// request makes this one stale.
    pub async fn fetch_schema(
        &self,
        endpoint: &str,
        with_credentials: bool,
    ) -> OpsResult<RequestToken> {
        let token = self.tokens.issue();
        self.dispatcher.apply(Event::SchemaRequested(token)).await?;

        let mut options = self.fetch_options.clone();
        options.with_credentials = with_credentials;

        let client = self.client.clone();
        let dispatcher = self.dispatcher.clone();
        let endpoint = endpoint.to_string();

        tokio::spawn(async move {
            let event = match client.fetch(&endpoint, &options).await {
                Ok(introspection) => {
                    info!(%endpoint, token = token.0, types = introspection.types().len(), "Schema fetched");
                    Event::SchemaFetched {
                        token,
                        introspection: Arc::new(introspection),
                    }
                }
                Err(err) => {
                    warn!(%endpoint, token = token.0, error = %err, "Schema fetch failed");
                    Event::SchemaFetchFailed {
                        token,
                        message: err.user_message(),
                    }
                }
            };
            if dispatcher.dispatch(event).is_err() {
                debug!(token = token.0, "Store closed before fetch finished");
            }
        });

        Ok(token)
    }

    /// Wait until no fetch is pending.
    pub async fn wait_for_schema(&self, timeout: Duration) -> OpsResult<Arc<ApplicationState>> {
        let mut rx = self.dispatcher.subscribe();
        let wait = async {
            loop {
                let state = Arc::clone(&rx.borrow_and_update());
                if !state.is_loading() {
                    return Ok::<_, OpsError>(state);
                }
                rx.changed().await.map_err(|_| OpsError::DispatcherClosed)?;
            }
        };

        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            OpsError::Fetch(FetchError::Transport(format!(
                "no response within {}s",
                timeout.as_secs()
            )))
        })?
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }

    pub async fn open_dialog(&self) -> OpsResult<Arc<ApplicationState>> {
        self.dialog_open.store(true, Ordering::SeqCst);
        self.dispatcher.apply(Event::ChooserOpened).await
    }

    /// Close the chooser, dropping whatever was staged.
    pub async fn close_dialog(&self) -> OpsResult<Arc<ApplicationState>> {
        self.dialog_open.store(false, Ordering::SeqCst);
        self.dispatcher.apply(self.chooser.discard()).await
    }

    pub async fn stage_preset(&self, name: &str) -> OpsResult<Arc<ApplicationState>> {
        let event = self.chooser.stage_preset(name)?;
        self.dispatcher.apply(event).await
    }

    pub async fn stage_text(&self, text: &str) -> OpsResult<Arc<ApplicationState>> {
        self.dispatcher.apply(self.chooser.stage_text(text)).await
    }

    /// Status of the currently staged choice.
    pub fn chooser_status(&self) -> ChooserStatus {
        self.chooser.status(self.snapshot().staged.as_ref())
    }

    /// Apply the staged choice and close the dialog.
    ///
    /// The choice is resolved and applied inside one store transaction, so a
    /// choice staged concurrently is either committed or kept, never lost.
    pub async fn commit(&self) -> OpsResult<Arc<ApplicationState>> {
        let chooser = self.chooser.clone();
        let (outcome, state) = self
            .dispatcher
            .transact(move |state| match chooser.commit(state.staged.as_ref()) {
                Ok(events) => (events, Ok(())),
                Err(blocked) => (Vec::new(), Err(blocked)),
            })
            .await?;
        outcome?;

        self.dialog_open.store(false, Ordering::SeqCst);
        Ok(state)
    }

    pub async fn discard(&self) -> OpsResult<Arc<ApplicationState>> {
        self.dispatcher.apply(self.chooser.discard()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::IntrospectionJsonParser;
    use crate::presets::Presets;
    use crate::store::Store;
    use tokio_util::sync::CancellationToken;
    use voyager_core::{Introspection, CUSTOM_PRESET};

    fn session(presets: Presets) -> (Session, CancellationToken) {
        let cancel = CancellationToken::new();
        let (dispatcher, _) = Dispatcher::spawn(Store::default(), cancel.clone());
        let chooser = SchemaChooser::new(Arc::new(presets), Arc::new(IntrospectionJsonParser));
        let client = IntrospectionClient::new(Duration::from_secs(5)).unwrap();
        (
            Session::new(dispatcher, chooser, client, FetchOptions::default()),
            cancel,
        )
    }

    fn presets() -> Presets {
        let mut presets = Presets::new();
        let value = serde_json::json!({ "__schema": {
            "queryType": { "name": "Query" },
            "types": [ { "kind": "OBJECT", "name": "Query", "fields": [] } ]
        } });
        presets
            .insert("demo", Introspection::from_value(value).unwrap())
            .unwrap();
        presets
    }

    #[tokio::test]
    async fn test_no_source_keeps_dialog_open() {
        let (session, cancel) = session(presets());
        session.bootstrap(&BootstrapParams::default()).await.unwrap();

        assert!(session.dialog_open());
        assert!(!session.snapshot().has_schema());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_preset_bootstrap_applies_schema() {
        let (session, cancel) = session(presets());
        let params = BootstrapParams {
            preset: Some("demo".into()),
            ..Default::default()
        };
        session.bootstrap(&params).await.unwrap();

        let state = session.snapshot();
        assert!(!session.dialog_open());
        assert!(state.has_schema());
        assert_eq!(state.active_preset.as_deref(), Some("demo"));
        assert!(state.staged.is_none());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_preset_without_presets_is_configuration_error() {
        let (session, cancel) = session(Presets::new());
        let params = BootstrapParams {
            preset: Some("demo".into()),
            ..Default::default()
        };

        assert!(matches!(
            session.bootstrap(&params).await,
            Err(OpsError::Configuration(_))
        ));
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_commit_blocked_keeps_dialog() {
        let (session, cancel) = session(presets());
        session.stage_preset(CUSTOM_PRESET).await.unwrap();

        assert_eq!(
            session.chooser_status().message.as_deref(),
            Some("please paste your introspection")
        );
        assert!(matches!(
            session.commit().await,
            Err(OpsError::CommitBlocked(_))
        ));
        assert!(session.dialog_open());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_blocked_commit_keeps_applied_schema() {
        let (session, cancel) = session(presets());
        session.stage_preset("demo").await.unwrap();
        session.commit().await.unwrap();
        let before = session.snapshot().schema.clone().unwrap();

        session.open_dialog().await.unwrap();
        session.stage_preset(CUSTOM_PRESET).await.unwrap();
        let result = session.commit().await;

        match result {
            Err(OpsError::CommitBlocked(blocked)) => {
                assert_eq!(blocked.to_string(), "please paste your introspection")
            }
            other => panic!("expected a blocked commit, got {:?}", other),
        }
        let after = session.snapshot();
        assert!(Arc::ptr_eq(&before, after.schema.as_ref().unwrap()));
        assert_eq!(after.active_preset.as_deref(), Some("demo"));
        assert!(after.staged.as_ref().unwrap().is_custom());
        assert!(session.dialog_open());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_choice_staged_during_commit_survives() {
        let (session, cancel) = session(presets());
        session.stage_preset("demo").await.unwrap();

        let (committed, staged) =
            tokio::join!(session.commit(), session.stage_preset(CUSTOM_PRESET));
        let committed = committed.unwrap();
        staged.unwrap();

        assert_eq!(committed.active_preset.as_deref(), Some("demo"));
        let state = session.snapshot();
        assert!(state.has_schema());
        assert!(state.staged.as_ref().unwrap().is_custom());
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_close_dialog_discards_staged() {
        let (session, cancel) = session(presets());
        session.stage_preset("demo").await.unwrap();

        let state = session.close_dialog().await.unwrap();
        assert!(state.staged.is_none());
        assert!(!session.dialog_open());
        cancel.cancel();
    }
}
