use crate::client::LspClient;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tower_lsp::lsp_types::MessageType;

/// Periodic liveness log until the session cancellation signal fires.
pub fn spawn<C: LspClient>(
    client: C,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::debug!("heartbeat started, every {:?}", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        let mut beats: u64 = 0;

        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    beats += 1;
                    client
                        .log_message(MessageType::LOG, format!("tron-lsp heartbeat #{}", beats))
                        .await;
                }
                changed = cancel.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        log::debug!("heartbeat stopped after {} beat(s)", beats);
    })
}
