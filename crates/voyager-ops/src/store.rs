//! The state container and the event dispatcher.
//!
//! [`Store`] owns the only handle to the current snapshot and replaces it on
//! every event. [`Dispatcher`] is the cloneable entry point collaborators use;
//! a single loop drains its queue, so events apply strictly in submission
//! order and one at a time.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use voyager_core::{reduce, ApplicationState, Event};

use crate::error::{OpsError, OpsResult};

/// Holds the current snapshot and publishes every new one.
#[derive(Debug)]
pub struct Store {
    state: Arc<ApplicationState>,
    tx: watch::Sender<Arc<ApplicationState>>,
    applied: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(ApplicationState::default())
    }
}

impl Store {
    pub fn new(initial: ApplicationState) -> Self {
        let state = Arc::new(initial);
        let (tx, _) = watch::channel(Arc::clone(&state));
        Self {
            state,
            tx,
            applied: 0,
        }
    }

    /// Apply one event. Returns whether the state changed.
    pub fn dispatch(&mut self, event: Event) -> bool {
        let kind = event.kind();
        let next = reduce(&self.state, event);
        self.applied += 1;

        if Arc::ptr_eq(&next, &self.state) {
            trace!(event = kind, "Event left state unchanged");
            return false;
        }

        debug!(
            event = kind,
            has_schema = next.has_schema(),
            revision = next.graph_view.revision.0,
            "State advanced"
        );
        self.state = next;
        self.tx.send_replace(Arc::clone(&self.state));
        true
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<ApplicationState> {
        Arc::clone(&self.state)
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ApplicationState>> {
        self.tx.subscribe()
    }

    /// Apply the events `plan` derives from the current snapshot, with
    /// nothing else applied in between.
    pub fn transact<F, R>(&mut self, plan: F) -> R
    where
        F: FnOnce(&ApplicationState) -> (Vec<Event>, R),
    {
        let (events, outcome) = plan(self.state.as_ref());
        for event in events {
            self.dispatch(event);
        }
        outcome
    }

    /// Number of events applied so far, including no-ops.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        cancel: CancellationToken,
    ) -> Self {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(applied = self.applied, "Dispatcher cancelled");
                    break;
                }
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else {
                        debug!(applied = self.applied, "All dispatcher handles dropped");
                        break;
                    };
                    match envelope.command {
                        Command::Event(event) => {
                            self.dispatch(event);
                        }
                        Command::Transaction(plan) => {
                            self.transact(|state| (plan(state), ()));
                        }
                    }
                    if let Some(ack) = envelope.ack {
                        let _ = ack.send(self.snapshot());
                    }
                }
            }
        }
        self
    }
}

type Plan = Box<dyn FnOnce(&ApplicationState) -> Vec<Event> + Send>;

enum Command {
    Event(Event),
    Transaction(Plan),
}

struct Envelope {
    command: Command,
    ack: Option<oneshot::Sender<Arc<ApplicationState>>>,
}

/// Cloneable handle that submits events to the store loop.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<Arc<ApplicationState>>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let command = match &self.command {
            Command::Event(event) => event.kind(),
            Command::Transaction(_) => "transaction",
        };
        f.debug_struct("Envelope").field("command", &command).finish()
    }
}

impl Dispatcher {
    /// Start the store loop on the current runtime.
    pub fn spawn(store: Store, cancel: CancellationToken) -> (Self, JoinHandle<Store>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = store.subscribe();
        let handle = tokio::spawn(store.run(rx, cancel));
        (Self { tx, state }, handle)
    }

    /// Queue an event without waiting for it to apply.
    pub fn dispatch(&self, event: Event) -> OpsResult<()> {
        self.tx
            .send(Envelope {
                command: Command::Event(event),
                ack: None,
            })
            .map_err(|_| OpsError::DispatcherClosed)
    }

    /// Queue an event and wait for the snapshot it produced.
    pub async fn apply(&self, event: Event) -> OpsResult<Arc<ApplicationState>> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Envelope {
                command: Command::Event(event),
                ack: Some(ack),
            })
            .map_err(|_| OpsError::DispatcherClosed)?;
        done.await.map_err(|_| OpsError::DispatcherClosed)
    }

    /// Run `plan` against the snapshot current at the head of the queue and
    /// apply the events it returns as one unit.
    ///
    /// Returns the plan's outcome and the snapshot after its events.
    pub async fn transact<F, R>(&self, plan: F) -> OpsResult<(R, Arc<ApplicationState>)>
    where
        F: FnOnce(&ApplicationState) -> (Vec<Event>, R) + Send + 'static,
        R: Send + 'static,
    {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let plan: Plan = Box::new(move |state| {
            let (events, outcome) = plan(state);
            let _ = outcome_tx.send(outcome);
            events
        });

        let (ack, done) = oneshot::channel();
        self.tx
            .send(Envelope {
                command: Command::Transaction(plan),
                ack: Some(ack),
            })
            .map_err(|_| OpsError::DispatcherClosed)?;

        let state = done.await.map_err(|_| OpsError::DispatcherClosed)?;
        let outcome = outcome_rx.await.map_err(|_| OpsError::DispatcherClosed)?;
        Ok((outcome, state))
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<ApplicationState> {
        Arc::clone(&self.state.borrow())
    }

    /// Watch snapshots as they are published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ApplicationState>> {
        self.state.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
