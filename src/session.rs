use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::MarketplaceApi;
use crate::error::AppError;
use crate::orchestrator::Orchestrator;
use crate::types::FetchState;

struct RunHandle {
    cancel: Option<CancellationToken>,
    /// Bumped on every `start` and `cancel`; a finishing run only publishes
    /// its outcome if it is still the latest generation.
    generation: u64,
}

/// Explicit fetch lifecycle for one consumer: `Idle` until the first
/// `start`, then `Loading` → `Ready`/`Failed`, published over a watch
/// channel so the presentation layer can poll (`state`) or subscribe.
/// Decoupled from the pipeline; the orchestrator knows nothing about it.
pub struct DashboardSession<C: MarketplaceApi + 'static> {
    orchestrator: Arc<Orchestrator<C>>,
    state_tx: watch::Sender<FetchState>,
    run: Arc<Mutex<RunHandle>>,
}

impl<C: MarketplaceApi + 'static> DashboardSession<C> {
    pub fn new(orchestrator: Arc<Orchestrator<C>>) -> Self {
        let (state_tx, _) = watch::channel(FetchState::Idle);
        Self {
            orchestrator,
            state_tx,
            run: Arc::new(Mutex::new(RunHandle {
                cancel: None,
                generation: 0,
            })),
        }
    }

    /// Current lifecycle state, cloned out of the channel.
    pub fn state(&self) -> FetchState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state_tx.subscribe()
    }

    /// Kick off a fetch for `shop_id`. An in-flight run is cancelled and
    /// superseded; its outcome is discarded.
    pub fn start(&self, shop_id: &str) {
        let cancel = CancellationToken::new();
        let generation = {
            let mut run = self.run.lock().expect("session lock poisoned");
            if let Some(prev) = run.cancel.replace(cancel.clone()) {
                prev.cancel();
            }
            run.generation += 1;
            run.generation
        };

        // `send_replace` stores the value even with no live receivers, so
        // `state` stays accurate for pure pollers.
        self.state_tx.send_replace(FetchState::Loading);

        let orchestrator = Arc::clone(&self.orchestrator);
        let state_tx = self.state_tx.clone();
        let run = Arc::clone(&self.run);
        let shop_id = shop_id.to_string();

        tokio::spawn(async move {
            let outcome = match orchestrator.fetch_store_data(&shop_id, &cancel).await {
                Ok(result) => FetchState::Ready(result),
                // A cancelled run was superseded or aborted; whoever
                // cancelled it already owns the state.
                Err(AppError::Cancelled) => return,
                Err(e) => FetchState::Failed(e.to_string()),
            };

            // Only the latest run gets to publish, and publishing retires
            // its token so a later `cancel` finds nothing in flight.
            let mut handle = run.lock().expect("session lock poisoned");
            if handle.generation == generation {
                handle.cancel = None;
                state_tx.send_replace(outcome);
            }
        });
    }

    /// Abort the in-flight run, if any, surfacing the cancellation as a
    /// failure rather than leaving a stale `Loading` behind. A no-op when
    /// nothing is in flight, so a late cancel never disturbs a terminal
    /// state.
    pub fn cancel(&self) {
        let mut run = self.run.lock().expect("session lock poisoned");
        if let Some(token) = run.cancel.take() {
            token.cancel();
            run.generation += 1;
            self.state_tx
                .send_replace(FetchState::Failed(AppError::Cancelled.to_string()));
        }
    }
}
