//! Keeps the rendered graph in step with the store.
//!
//! The pipeline watches snapshots. Each new view revision with a schema and
//! no image yet starts a render; a newer revision cancels the one in flight.
//! Focus requests are forwarded to the renderer and acknowledged exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use voyager_core::{ApplicationState, DisplayOptions, Event, Introspection, RenderedImage, ViewRevision};

use crate::error::OpsResult;
use crate::store::Dispatcher;

/// Something that can draw a schema graph.
#[async_trait]
pub trait GraphRenderer: Send + Sync {
    async fn render(
        &self,
        schema: Arc<Introspection>,
        options: DisplayOptions,
    ) -> OpsResult<RenderedImage>;

    /// Bring the element with `id` into view.
    async fn focus(&self, _id: &str) -> OpsResult<()> {
        Ok(())
    }
}

/// Background task driving a [`GraphRenderer`] from store snapshots.
pub struct RenderPipeline {
    dispatcher: Dispatcher,
    renderer: Arc<dyn GraphRenderer>,
    in_flight: Option<(ViewRevision, CancellationToken)>,
    /// Focus request count last handed to the renderer.
    seen_focus_requests: u64,
}

impl RenderPipeline {
    /// Start the pipeline. It stops on `cancel` or when the store loop ends.
    pub fn spawn(
        dispatcher: Dispatcher,
        renderer: Arc<dyn GraphRenderer>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pipeline = Self {
            dispatcher,
            renderer,
            in_flight: None,
            seen_focus_requests: 0,
        };
        tokio::spawn(pipeline.run(cancel))
    }

    async fn run(mut self, cancel: CancellationToken) {
        let mut rx = self.dispatcher.subscribe();

        loop {
            let state = Arc::clone(&rx.borrow_and_update());
            self.on_snapshot(&state, &cancel);

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if let Some((_, token)) = self.in_flight.take() {
            token.cancel();
        }
        debug!("Render pipeline stopped");
    }

    fn on_snapshot(&mut self, state: &ApplicationState, cancel: &CancellationToken) {
        self.maybe_render(state, cancel);
        self.maybe_focus(state);
    }

    fn maybe_render(&mut self, state: &ApplicationState, cancel: &CancellationToken) {
        let Some(schema) = state.schema.as_ref() else {
            return;
        };
        let revision = state.graph_view.revision;

        if state.graph_view.rendered_image.is_some() {
            return;
        }
        if matches!(&self.in_flight, Some((current, _)) if *current == revision) {
            return;
        }

        if let Some((superseded, token)) = self.in_flight.take() {
            debug!(revision = superseded.0, "Cancelling superseded render");
            token.cancel();
        }

        let token = cancel.child_token();
        self.in_flight = Some((revision, token.clone()));

        let renderer = Arc::clone(&self.renderer);
        let dispatcher = self.dispatcher.clone();
        let schema = Arc::clone(schema);
        let options = state.display_options.clone();

        debug!(revision = revision.0, "Starting render");
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = renderer.render(schema, options) => result,
            };

            let event = match result {
                Ok(image) => Event::RenderCompleted {
                    image,
                    revision: Some(revision),
                },
                Err(err) => {
                    warn!(revision = revision.0, error = %err, "Render failed");
                    Event::ErrorReported(err.to_string())
                }
            };
            if dispatcher.dispatch(event).is_err() {
                debug!("Store closed before render finished");
            }
        });
    }

    fn maybe_focus(&mut self, state: &ApplicationState) {
        let view = &state.graph_view;
        if view.focus_requests == self.seen_focus_requests {
            return;
        }
        self.seen_focus_requests = view.focus_requests;

        // Coalesced snapshots may hide an ack followed by a new request for
        // the same id; the counter still moved, so it is handled here.
        let Some(id) = view.focused_id.clone() else {
            return;
        };

        let renderer = Arc::clone(&self.renderer);
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            if let Err(err) = renderer.focus(&id).await {
                warn!(element = %id, error = %err, "Focus failed");
            }
            let _ = dispatcher.dispatch(Event::ElementFocusAcknowledged(id));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use voyager_core::DisplayOptionsPatch;

    fn schema() -> Arc<Introspection> {
        let value = serde_json::json!({ "__schema": {
            "queryType": { "name": "Query" },
            "types": [ { "kind": "OBJECT", "name": "Query", "fields": [] } ]
        } });
        Arc::new(Introspection::from_value(value).unwrap())
    }

    /// Renders `skip_relay=<flag>`; the first render waits for `release`.
    /// With `hold_first_focus`, the first focus waits for `focus_release`.
    #[derive(Default)]
    struct ScriptedRenderer {
        release: Notify,
        calls: Mutex<Vec<bool>>,
        focused: Mutex<Vec<String>>,
        hold_first_focus: bool,
        focus_release: Notify,
    }

    #[async_trait]
    impl GraphRenderer for ScriptedRenderer {
        async fn render(
            &self,
            _schema: Arc<Introspection>,
            options: DisplayOptions,
        ) -> OpsResult<RenderedImage> {
            let first = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(options.skip_relay);
                calls.len() == 1
            };
            if first {
                self.release.notified().await;
            }
            Ok(RenderedImage::new(format!("skip_relay={}", options.skip_relay)))
        }

        async fn focus(&self, id: &str) -> OpsResult<()> {
            let first = {
                let mut focused = self.focused.lock().unwrap();
                focused.push(id.to_string());
                focused.len() == 1
            };
            if first && self.hold_first_focus {
                self.focus_release.notified().await;
            }
            Ok(())
        }
    }

    async fn wait_for<F>(dispatcher: &Dispatcher, predicate: F) -> Arc<ApplicationState>
    where
        F: Fn(&ApplicationState) -> bool,
    {
        let mut rx = dispatcher.subscribe();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let state = Arc::clone(&rx.borrow_and_update());
                if predicate(&state) {
                    return state;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("condition not reached")
    }

    #[tokio::test]
    async fn test_superseded_render_never_lands() {
        let cancel = CancellationToken::new();
        let (dispatcher, _store) = Dispatcher::spawn(Store::default(), cancel.clone());
        let renderer = Arc::new(ScriptedRenderer::default());
        RenderPipeline::spawn(dispatcher.clone(), renderer.clone(), cancel.clone());

        dispatcher.apply(Event::schema_applied(schema())).await.unwrap();
        while renderer.calls.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        dispatcher
            .apply(Event::DisplayOptionsChanged(
                DisplayOptionsPatch::default().skip_relay(false),
            ))
            .await
            .unwrap();
        renderer.release.notify_one();

        let state = wait_for(&dispatcher, |s| s.graph_view.rendered_image.is_some()).await;
        assert_eq!(
            state.graph_view.rendered_image.as_ref().unwrap().as_str(),
            "skip_relay=false"
        );
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_focus_is_acknowledged_once() {
        let cancel = CancellationToken::new();
        let (dispatcher, _store) = Dispatcher::spawn(Store::default(), cancel.clone());
        let renderer = Arc::new(ScriptedRenderer::default());
        RenderPipeline::spawn(dispatcher.clone(), renderer.clone(), cancel.clone());

        dispatcher
            .apply(Event::ElementFocusRequested("TYPE::User".into()))
            .await
            .unwrap();

        wait_for(&dispatcher, |s| s.graph_view.focused_id.is_none()).await;
        assert_eq!(*renderer.focused.lock().unwrap(), vec!["TYPE::User".to_string()]);
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_repeated_focus_after_coalesced_ack_is_handled() {
        let cancel = CancellationToken::new();
        let (dispatcher, _store) = Dispatcher::spawn(Store::default(), cancel.clone());
        let renderer = Arc::new(ScriptedRenderer {
            hold_first_focus: true,
            ..Default::default()
        });
        RenderPipeline::spawn(dispatcher.clone(), renderer.clone(), cancel.clone());

        dispatcher
            .apply(Event::ElementFocusRequested("TYPE::User".into()))
            .await
            .unwrap();
        while renderer.focused.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Ack and re-request land together before the pipeline looks again.
        dispatcher
            .dispatch(Event::ElementFocusAcknowledged("TYPE::User".into()))
            .unwrap();
        dispatcher
            .dispatch(Event::ElementFocusRequested("TYPE::User".into()))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while renderer.focused.lock().unwrap().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("second focus request was never forwarded");
        renderer.focus_release.notify_one();

        let state = wait_for(&dispatcher, |s| s.graph_view.focused_id.is_none()).await;
        assert_eq!(state.graph_view.focus_requests, 2);
        cancel.cancel();
    }
}
