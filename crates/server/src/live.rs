// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live notifications for operator dashboards.
//!
//! Events are informational. They tell connected dashboards that
//! something changed so they can refetch over HTTP; they never carry
//! authoritative data and the socket accepts no commands.
//!
//! Every connected client receives every event, so payloads carry
//! identifiers only, never donor details.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use donation_domain::TransactionStatus;
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Maximum number of events to buffer in the broadcast channel.
/// If clients cannot keep up, older events will be dropped.
const EVENT_BUFFER_SIZE: usize = 100;

/// Live event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A donation was recorded.
    TransactionRecorded {
        /// The new transaction.
        transaction_id: i64,
        /// Its receipt number.
        receipt_number: String,
        /// The branch it belongs to.
        branch_id: i64,
    },
    /// A pending donation was amended.
    TransactionUpdated {
        /// The amended transaction.
        transaction_id: i64,
        /// The branch it belongs to.
        branch_id: i64,
    },
    /// A pending donation was decided.
    TransactionValidated {
        /// The decided transaction.
        transaction_id: i64,
        /// The branch it belongs to.
        branch_id: i64,
        /// `valid` or `rejected`.
        status: TransactionStatus,
    },
    /// A pending donation was deleted.
    TransactionDeleted {
        /// The deleted transaction.
        transaction_id: i64,
    },
    /// Program rates were pushed down to stored transactions.
    RatesPropagated {
        /// Restricted program, if any.
        program_id: Option<i64>,
        /// Transactions rewritten.
        transactions_updated: u64,
    },
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (ISO 8601).
        timestamp: String,
    },
}

/// Fan-out of live events to every connected WebSocket client.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    /// The broadcast channel sender.
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event to all connected clients.
    ///
    /// Never blocks; with no clients connected the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Subscribes to events broadcast from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for GET `/live`.
///
/// Upgrades to a WebSocket, sends a `connected` event, then streams every
/// later event until the client goes away.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Handles an individual WebSocket connection.
///
/// Sends a connection confirmation, then streams all live events until
/// the client disconnects or an error occurs.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveEventBroadcaster>) {
    info!("Dashboard connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected_event = LiveEvent::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| String::from("unknown")),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live event");
                }
            }
        }
    });

    // Clients only listen; anything they send is dropped.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Dashboard disconnected from live event stream");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(transaction_id: i64) -> LiveEvent {
        LiveEvent::TransactionRecorded {
            transaction_id,
            receipt_number: format!("TRX-2026-{transaction_id:06}"),
            branch_id: 1,
        }
    }

    #[test]
    fn test_broadcaster_starts_without_receivers() {
        let broadcaster = LiveEventBroadcaster::new();
        assert_eq!(broadcaster.tx.receiver_count(), 0);
        broadcaster.broadcast(&recorded(1));
    }

    #[test]
    fn test_every_receiver_gets_the_event() {
        let broadcaster = LiveEventBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.broadcast(&recorded(7));

        assert_eq!(first.try_recv().unwrap(), recorded(7));
        assert_eq!(second.try_recv().unwrap(), recorded(7));
    }

    #[test]
    fn test_late_subscribers_miss_earlier_events() {
        let broadcaster = LiveEventBroadcaster::new();
        broadcaster.broadcast(&LiveEvent::TransactionDeleted { transaction_id: 3 });

        let mut rx = broadcaster.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_events_are_tagged_by_type() {
        let event = LiveEvent::TransactionValidated {
            transaction_id: 12,
            branch_id: 2,
            status: TransactionStatus::Rejected,
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "transaction_validated");
        assert_eq!(json["transaction_id"], 12);

        let back: LiveEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_rates_propagated_payload() {
        let json: String = serde_json::to_string(&LiveEvent::RatesPropagated {
            program_id: None,
            transactions_updated: 4,
        })
        .unwrap();

        assert!(json.contains("\"type\":\"rates_propagated\""));
        assert!(json.contains("\"transactions_updated\":4"));
    }
}
