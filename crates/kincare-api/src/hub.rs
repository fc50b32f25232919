//! WebSocket relay hub
//!
//! Every live socket registers here and receives a [`Subscription`] to one
//! shared broadcast channel. Messages are wrapped in an [`Envelope`] carrying
//! the originating connection, so a subscriber can skip its own broadcasts.
//!
//! The channel is bounded. A subscriber that falls behind by more than the
//! channel capacity loses the oldest envelopes and carries on; it never
//! blocks the hub or the other sockets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::websocket::ServerMessage;

pub type ConnectionId = Uuid;

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Envelopes buffered per subscriber before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    /// `None` for messages raised by REST handlers
    pub origin: Option<ConnectionId>,
    pub message: ServerMessage,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub connected_at: DateTime<Utc>,
    /// Last user that sent a message over this socket
    pub user_id: Option<i64>,
}

pub struct RelayHub {
    tx: broadcast::Sender<Arc<Envelope>>,
    connections: DashMap<ConnectionId, ConnectionInfo>,
}

impl RelayHub {
    pub fn new(config: HubConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            tx,
            connections: DashMap::new(),
        }
    }

    /// Add a connection and start receiving broadcasts for it
    pub fn register(&self) -> Subscription {
        let id = Uuid::new_v4();
        // Subscribe before the connection is visible so nothing sent after
        // registration is missed
        let rx = self.tx.subscribe();
        self.connections.insert(
            id,
            ConnectionInfo {
                id,
                connected_at: Utc::now(),
                user_id: None,
            },
        );
        self.record_count();
        info!(connection = %id, total = self.connections.len(), "WebSocket connected");
        Subscription { id, rx }
    }

    /// Forget a socket, returning what was known about it
    pub fn unregister(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        let (_, info) = self.connections.remove(&id)?;
        self.record_count();
        let seconds = (Utc::now() - info.connected_at).num_seconds();
        info!(
            connection = %id,
            user_id = ?info.user_id,
            seconds,
            total = self.connections.len(),
            "WebSocket disconnected"
        );
        Some(info)
    }

    /// Remember which user is talking over a connection
    pub fn identify(&self, id: ConnectionId, user_id: i64) {
        if let Some(mut info) = self.connections.get_mut(&id) {
            info.user_id = Some(user_id);
        }
    }

    /// Send to every connection. Returns how many subscribers were reached.
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        self.publish(None, message)
    }

    /// Send to every connection except `origin`
    pub fn broadcast_except(&self, origin: ConnectionId, message: ServerMessage) -> usize {
        self.publish(Some(origin), message)
    }

    fn publish(&self, origin: Option<ConnectionId>, message: ServerMessage) -> usize {
        let kind = message.kind();
        // Err only means nobody is listening
        let reached = self
            .tx
            .send(Arc::new(Envelope { origin, message }))
            .unwrap_or(0);
        metrics::counter!("kincare_ws_broadcasts_total", "type" => kind).increment(1);
        debug!(kind, reached, "Broadcast");
        reached
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn record_count(&self) {
        metrics::gauge!("kincare_ws_connections").set(self.connections.len() as f64);
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// One connection's view of the broadcast channel
pub struct Subscription {
    id: ConnectionId,
    rx: broadcast::Receiver<Arc<Envelope>>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next message meant for this connection; `None` once the hub is gone
    pub async fn next(&mut self) -> Option<ServerMessage> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.origin == Some(self.id) => continue,
                Ok(envelope) => return Some(envelope.message.clone()),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(connection = %self.id, skipped, "Slow WebSocket client skipped messages");
                    metrics::counter!("kincare_ws_lagged_total").increment(skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
