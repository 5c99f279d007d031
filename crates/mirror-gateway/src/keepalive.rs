//! Keep-alive scheduler
//!
//! Runs on its own timer, independent of the receive loop, and hands each
//! liveness frame to the transport's writer task through the outbound
//! queue. The hand-off waits a bounded time; exceeding it marks the
//! session stalled, which the next transport operation surfaces as a
//! fatal error. Closing the transport stops the timer deterministically,
//! and a reconnect arms a fresh scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::protocol::ClientFrame;

/// Independent task submitting periodic liveness frames
pub struct KeepAlive {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl KeepAlive {
    /// Start the scheduler with a fresh stop signal
    pub fn start(
        outbound: mpsc::Sender<ClientFrame>,
        interval: Duration,
        send_timeout: Duration,
        stalled: Arc<AtomicBool>,
    ) -> Self {
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately; the cadence starts
            // one full interval after connect
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match outbound.send_timeout(ClientFrame::Ping { data: 0 }, send_timeout).await {
                            Ok(()) => {
                                tracing::trace!("Keep-alive ping queued");
                            }
                            Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                                stalled.store(true, Ordering::SeqCst);
                                tracing::error!(
                                    timeout_secs = send_timeout.as_secs(),
                                    "Keep-alive hand-off timed out; session stalled"
                                );
                                break;
                            }
                            Err(mpsc::error::SendTimeoutError::Closed(_)) => {
                                tracing::debug!("Outbound queue closed, stopping keep-alive");
                                break;
                            }
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            tracing::debug!("Keep-alive stop signal received");
                            break;
                        }
                    }
                }
            }
        });

        Self { stop, handle }
    }

    /// Signal the scheduler to stop; no ticks fire after this returns
    /// and the task has been observed to finish via [`Self::shutdown`]
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Stop the scheduler and wait for its task to finish
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }

    /// Check whether the scheduler task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
