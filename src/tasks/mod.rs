//! Timer-driven background work: ingesting mentions and sending notifications.

pub mod notifier;
pub mod poller;

pub use notifier::Notifier;
pub use poller::Poller;

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::error::StoreError;
use crate::source::SourceError;

#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("message source: {0}")]
    Source(#[from] SourceError),
}

/// Receiver half of the process-wide shutdown signal. `true` means stop.
pub type Shutdown = watch::Receiver<bool>;

/// Call `tick` every `every` until `shutdown` fires. The first tick runs
/// immediately; a slow tick delays the next one rather than bunching them up.
pub(crate) async fn run_every<F, Fut>(
    name: &'static str,
    every: Duration,
    mut shutdown: Shutdown,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(task = name, every_secs = every.as_secs(), "background task started");

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => tick().await,
        }
    }

    info!(task = name, "background task stopped");
}
