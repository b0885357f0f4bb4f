//! Controller driving reconcile passes from watch events.

use std::sync::Arc;
use std::time::Duration;

use hydroculture_core::NamespacedName;
use hydroculture_store::{
    Error as StoreError, HerbsWatch, Result as StoreResult, WatchEvent, WatchSubscription,
};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::queue::{RequeueTimers, WorkQueue};
use crate::reconciler::HerbsReconciler;
use crate::types::{Convergence, ReconcileContext, Reconciled};

/// Runs [`HerbsReconciler`] passes for every object the watch source
/// reports, and again whenever a pass asks to be requeued.
pub struct Controller {
    /// The reconciler.
    reconciler: Arc<HerbsReconciler>,
    /// Source of object keys and change events.
    source: Arc<dyn HerbsWatch>,
    /// Controller configuration.
    config: ControllerConfig,
    /// Stop signal receiver, also handed to every pass as its cancellation.
    stop_rx: watch::Receiver<bool>,
    /// Stop signal sender (for external control).
    stop_tx: watch::Sender<bool>,
}

impl Controller {
    /// Create a new controller.
    pub fn new(
        reconciler: Arc<HerbsReconciler>,
        source: Arc<dyn HerbsWatch>,
        config: ControllerConfig,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            reconciler,
            source,
            config,
            stop_rx,
            stop_tx,
        }
    }

    /// Run until stopped.
    ///
    /// Every known object is queued once at start. In-flight passes are
    /// cancelled and awaited before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if listing objects fails or the watch
    /// stream closes.
    pub async fn run(&self) -> Result<()> {
        let span = info_span!("controller", name = %self.config.name);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<()> {
        let mut stop_rx = self.stop_rx.clone();
        if *stop_rx.borrow_and_update() {
            info!("Controller stopped before start");
            return Ok(());
        }

        info!(
            workers = self.config.max_concurrent_reconciles,
            "Starting controller"
        );

        let mut events = self.source.subscribe();
        let mut queue = WorkQueue::new();
        self.resync(&mut queue).await?;

        let mut tasks: JoinSet<(NamespacedName, Reconciled)> = JoinSet::new();
        let mut requeues = RequeueTimers::new();

        let outcome = loop {
            self.dispatch(&mut queue, &mut tasks);

            tokio::select! {
                event = events.recv() => {
                    if let Err(e) = self.absorb(event, &mut events, &mut queue).await {
                        break Err(e);
                    }
                }
                Some(key) = requeues.next_due() => queue.add(key),
                Some(joined) = tasks.join_next() => match joined {
                    Ok((key, reconciled)) => {
                        queue.done(&key);
                        self.schedule(&mut requeues, key, &reconciled);
                    }
                    Err(e) => error!(error = %e, "Reconcile task failed"),
                },
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow_and_update() {
                        break Ok(());
                    }
                }
            }
        };

        // Pending requeues are aborted when `requeues` drops.
        while let Some(joined) = tasks.join_next().await {
            if let Ok((key, reconciled)) = joined {
                if let Some(e) = reconciled.error {
                    debug!(key = %key, error = %e, "Pass ended during shutdown");
                }
            }
        }

        info!(pending = requeues.pending(), "Controller stopped");
        outcome
    }

    /// Queue every object the source currently knows.
    async fn resync(&self, queue: &mut WorkQueue) -> Result<()> {
        let keys = self.source.list().await.map_err(Error::Watch)?;
        debug!(count = keys.len(), "Queued all objects");
        keys.into_iter().for_each(|key| queue.add(key));
        Ok(())
    }

    /// Queue the received event and everything already buffered behind it,
    /// so a burst collapses into one pass per key.
    async fn absorb(
        &self,
        received: StoreResult<WatchEvent>,
        events: &mut WatchSubscription,
        queue: &mut WorkQueue,
    ) -> Result<()> {
        let mut next = received.map(Some);
        loop {
            match next {
                Ok(Some(event)) => {
                    debug!(key = %event.key, event = %event.event_type, "Watch event");
                    queue.add(event.key);
                }
                Ok(None) => return Ok(()),
                Err(StoreError::WatchLagged { missed }) => {
                    warn!(missed, "Watch lagged, relisting");
                    return self.resync(queue).await;
                }
                Err(e) => return Err(Error::Watch(e)),
            }
            next = events.try_recv();
        }
    }

    /// Start passes until the worker limit is reached or the queue is empty.
    fn dispatch(&self, queue: &mut WorkQueue, tasks: &mut JoinSet<(NamespacedName, Reconciled)>) {
        while tasks.len() < self.config.max_concurrent_reconciles {
            let Some(key) = queue.pop() else {
                break;
            };
            debug!(
                key = %key,
                queued = queue.len(),
                in_flight = queue.in_flight(),
                "Starting pass"
            );
            let reconciler = Arc::clone(&self.reconciler);
            let ctx = ReconcileContext::new(self.stop_rx.clone());
            tasks.spawn(async move {
                let reconciled = reconciler.reconcile(&ctx, &key).await;
                (key, reconciled)
            });
        }
    }

    /// Arrange the next pass for `key` according to the outcome.
    fn schedule(&self, requeues: &mut RequeueTimers, key: NamespacedName, reconciled: &Reconciled) {
        if let Some(e) = &reconciled.error {
            error!(key = %key, error = %e, "Reconciler error");
        }

        let Some(delay) = self.requeue_delay(reconciled) else {
            return;
        };

        let delay_ms = delay.as_millis();
        if requeues.add_after(key.clone(), delay) {
            debug!(key = %key, delay_ms, "Requeue scheduled");
        } else {
            debug!(key = %key, delay_ms, "Earlier requeue already pending");
        }
    }

    /// A positive delay always wins; an error without one falls back to
    /// the error delay.
    fn requeue_delay(&self, reconciled: &Reconciled) -> Option<Duration> {
        let delay = reconciled.result.requeue_after;
        match (&reconciled.error, delay.is_zero()) {
            (_, false) => Some(delay),
            (Some(_), true) => Some(self.config.reconciler.requeue_after(Convergence::Failed)),
            (None, true) => None,
        }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Stop the controller.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Get a stopper handle.
    pub fn stopper(&self) -> ControllerStopper {
        ControllerStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }
}

/// Handle to stop a running [`Controller`].
#[derive(Clone)]
pub struct ControllerStopper {
    stop_tx: watch::Sender<bool>,
}

impl ControllerStopper {
    /// Stop the controller.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}
