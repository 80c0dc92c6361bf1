//! Value poller for input pins.
//!
//! Without an interrupt line, input changes are found by re-reading the
//! value attribute on a fixed period. One tokio task runs per ready input
//! handle; it holds only a weak reference to the handle and exits once the
//! handle is closed or dropped.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::fs::PinFs;
use crate::pin::PinInner;

/// Cancellable poll task. Aborted on drop.
#[derive(Debug)]
pub(crate) struct Poller {
    task: JoinHandle<()>,
}

impl Poller {
    /// Start polling `target` every `period`, first tick one period from now.
    pub(crate) fn spawn<F: PinFs>(target: Weak<PinInner<F>>, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            // A slow read must not cause a burst of catch-up reads.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(pin) = target.upgrade() else {
                    trace!("poller target dropped, stopping");
                    break;
                };

                match pin.poll_tick().await {
                    Ok(Some(event)) => {
                        trace!("GPIO {} poll observed {}", event.pin, event.value)
                    }
                    Ok(None) => {}
                    Err(err) => warn!("{}; retrying next tick", err),
                }

                if pin.phase().is_terminal() {
                    debug!("GPIO {} poller stopping", pin.pin());
                    break;
                }
            }
        });

        Self { task }
    }

    /// Stop the task. A tick in progress is dropped at its next suspension
    /// point.
    pub(crate) fn cancel(&self) {
        self.task.abort();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
