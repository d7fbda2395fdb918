use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::error::AdmissionError;
use crate::metrics::{ENTRIES_RECLAIMED, STORE_ENTRIES};
use crate::store::Store;

// Evicts entries whose request and resource windows have both elapsed.
// An entry with one live window is kept even if its counters are zero.
#[derive(Debug)]
pub struct Reclaimer<S, C> {
    store: Arc<S>,
    clock: C,
}

impl<S, C: Clone> Clone for Reclaimer<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
        }
    }
}

impl<S, C> Reclaimer<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    // One pass over the store; returns how many entries were evicted
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();

        // collect first, the store must not be re-entered from for_each
        let mut candidates = Vec::new();
        self.store.for_each(&mut |identity, entry| {
            if entry.is_reclaimable(now) {
                candidates.push(identity.to_owned());
            }
        });

        // re-check under the entry lock, activity may have renewed a window
        let removed = candidates
            .iter()
            .filter(|identity| self.store.remove_if(identity, |entry| entry.is_reclaimable(now)))
            .count();

        ENTRIES_RECLAIMED.inc_by(removed as f64);
        STORE_ENTRIES.set(self.store.len() as f64);
        removed
    }
}

impl<S, C> Reclaimer<S, C>
where
    S: Store + 'static,
    C: Clock + Clone + 'static,
{
    // Start sweeping every `period` on the tokio runtime. The first sweep
    // happens one period after the call. A zero period is rejected.
    pub fn spawn(self, period: Duration) -> Result<ReclaimerHandle, AdmissionError> {
        if period.is_zero() {
            return Err(AdmissionError::InvalidWindow {
                name: "reclaim interval",
            });
        }
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Reclaimer started (interval: {:?})", period);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                }

                // a panicking store must not take the host down
                let sweeper = self.clone();
                match tokio::task::spawn_blocking(move || sweeper.sweep()).await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "reclaimed idle entries"),
                    Err(e) => error!("Reclaimer sweep failed: {}", e),
                }
            }

            info!("Reclaimer stopped");
        });

        Ok(ReclaimerHandle {
            shutdown: shutdown_tx,
            task,
        })
    }
}

// Owns the background sweep. Dropping the handle also stops the task,
// since the shutdown channel closes.
#[derive(Debug)]
pub struct ReclaimerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReclaimerHandle {
    pub async fn shutdown(self) {
        let Self { shutdown, task } = self;
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            error!("Reclaimer task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
