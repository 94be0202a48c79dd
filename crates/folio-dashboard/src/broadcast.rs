//! WebSocket broadcast functionality.
//!
//! Every refresh interval the broadcaster re-evaluates the refresh gate and
//! pushes the result to all connected clients. A fresh snapshot follows only
//! while the gate is open, so outside market hours clients keep showing the
//! data they loaded.

use std::time::Duration;

use chrono::Utc;
use folio_core::{MarketStatus, RefreshDecision};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::state::DashboardState;
use crate::types::{DashboardMessage, RefreshView};

/// Run the broadcaster task.
pub async fn run_broadcaster(state: DashboardState, tx: broadcast::Sender<String>) {
    let period = Duration::from_secs(state.config().refresh_interval_secs.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The first tick completes immediately; clients get a snapshot on connect.
    interval.tick().await;

    loop {
        interval.tick().await;

        for msg in tick_messages(&state).await {
            send(&tx, &msg);
        }
    }
}

/// Messages for one broadcaster tick.
pub(crate) async fn tick_messages(state: &DashboardState) -> Vec<DashboardMessage> {
    let (status, decision) = state.evaluate_gate().await;
    tick_messages_for(state, status, decision).await
}

/// Messages for an evaluated gate. When open, the gate message carries the
/// same decision as the snapshot that follows it.
async fn tick_messages_for(
    state: &DashboardState,
    status: MarketStatus,
    decision: RefreshDecision,
) -> Vec<DashboardMessage> {
    if !decision.refresh {
        trace!("Refresh gate closed, skipping snapshot push");
        return vec![DashboardMessage::RefreshGate {
            timestamp_ms: Utc::now().timestamp_millis(),
            refresh: RefreshView::new(decision, state.config().refresh_interval_secs),
        }];
    }

    let snapshot = state.snapshot_for(status, decision).await;
    vec![
        DashboardMessage::RefreshGate {
            timestamp_ms: snapshot.timestamp_ms,
            refresh: snapshot.refresh.clone(),
        },
        DashboardMessage::Update(snapshot),
    ]
}

/// Serialize and broadcast one message.
pub(crate) fn send(tx: &broadcast::Sender<String>, msg: &DashboardMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => match tx.send(json) {
            Ok(n) => {
                trace!(receivers = n, "Broadcast message sent");
            }
            Err(_) => {
                // No receivers - this is normal when no clients connected
                trace!("No WebSocket receivers connected");
            }
        },
        Err(e) => {
            debug!(error = %e, "Failed to serialize dashboard message");
        }
    }
}
