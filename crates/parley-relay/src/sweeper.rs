//! Expiry Sweeper: a recurring task that deletes lapsed attachments.

use std::{sync::Arc, time::Duration};

use parley_core::{Ledger, clock::Clock};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::attachment::AttachmentTracker;

pub struct ExpirySweeper<L> {
  tracker:  AttachmentTracker<L>,
  clock:    Arc<dyn Clock>,
  interval: Duration,
}

impl<L> ExpirySweeper<L>
where
  L: Ledger + 'static,
{
  pub fn new(
    tracker: AttachmentTracker<L>,
    clock: Arc<dyn Clock>,
    interval: Duration,
  ) -> Self {
    Self { tracker, clock, interval }
  }

  /// Sweep once. Failures are logged and left for the next tick.
  pub async fn tick(&self) -> Option<u64> {
    match self.tracker.sweep_expired(self.clock.now()).await {
      Ok(0) => {
        debug!("no expired attachments");
        Some(0)
      }
      Ok(removed) => {
        info!(removed, "expired attachments swept");
        Some(removed)
      }
      Err(e) => {
        warn!(error = %e, "attachment sweep failed");
        None
      }
    }
  }

  /// Tick until `shutdown` changes or its sender is dropped. The first sweep
  /// runs immediately.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");
    loop {
      tokio::select! {
        _ = shutdown.changed() => break,
        _ = ticker.tick() => {
          self.tick().await;
        }
      }
    }
    info!("expiry sweeper stopped");
  }

  pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(self.run(shutdown))
  }
}
