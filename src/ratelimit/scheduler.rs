//! Background task that closes each window.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::limiter::Shared;

/// Spawn the window scheduler on `runtime`.
///
/// The first reset fires at `first_reset`, then every `window` after that.
/// Ticks missed while the runtime was stalled are skipped rather than
/// replayed. The task exits on its own once the limiter owning `shared` is
/// gone or stopped.
pub(super) fn spawn(
    runtime: &Handle,
    shared: Weak<Shared>,
    first_reset: Instant,
    window: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = interval_at(first_reset, window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let Some(shared) = shared.upgrade() else {
                debug!("Limiter dropped, window scheduler exiting");
                break;
            };
            let Some(released) = shared.reset() else {
                debug!("Limiter stopped, window scheduler exiting");
                break;
            };
            trace!(released = released, "Window reset");
        }
    })
}
