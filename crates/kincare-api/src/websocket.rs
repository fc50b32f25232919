//! WebSocket relay
//!
//! `GET /ws` carries JSON text frames tagged by `type`. A `user_message` is
//! answered to the sender with `agent_response`; when the persona hands the
//! conversation off, every other socket receives `agent_communication`.
//! Photo and care-notification events from the REST side reach all sockets.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use kincare_types::{AgentId, AgentResponse, CareNotification, FamilyPhoto, Priority};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::hub::ConnectionId;
use crate::state::AppState;

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    UserMessage {
        user_id: i64,
        agent_id: AgentId,
        message: String,
    },
    Ping,
}

/// Frames the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AgentResponse {
        response: AgentResponse,
    },
    #[serde(rename_all = "camelCase")]
    AgentCommunication {
        from_agent: AgentId,
        to_agent: AgentId,
        message: String,
        priority: Priority,
    },
    #[serde(rename_all = "camelCase")]
    NewPhoto {
        frame_id: i64,
        photo: FamilyPhoto,
    },
    CareNotification {
        notification: CareNotification,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error() -> Self {
        Self::Error {
            message: "Failed to process message".to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentResponse { .. } => "agent_response",
            Self::AgentCommunication { .. } => "agent_communication",
            Self::NewPhoto { .. } => "new_photo",
            Self::CareNotification { .. } => "care_notification",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }

    fn to_frame(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json)),
            Err(e) => {
                warn!(kind = self.kind(), error = %e, "Failed to encode frame");
                None
            }
        }
    }
}

/// Run a user message through the agents and fan out any handoff.
///
/// `origin` is the socket that sent it, if any; that socket gets the reply
/// directly and is left out of the handoff broadcast.
pub async fn relay_user_message(
    state: &AppState,
    origin: Option<ConnectionId>,
    user_id: i64,
    agent_id: AgentId,
    message: &str,
) -> ApiResult<AgentResponse> {
    let response = state
        .agents
        .process_user_message(user_id, agent_id, message)
        .await?;

    if let Some(handoff) = &response.agent_communication {
        let notice = ServerMessage::AgentCommunication {
            from_agent: agent_id,
            to_agent: handoff.to_agent,
            message: handoff.message.clone(),
            priority: handoff.priority,
        };
        match origin {
            Some(id) => state.hub.broadcast_except(id, notice),
            None => state.hub.broadcast(notice),
        };
    }
    Ok(response)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// User messages a socket may have waiting behind the one being answered
const TURN_QUEUE: usize = 16;

/// One `user_message` waiting for the agents
#[derive(Debug)]
struct Turn {
    user_id: i64,
    agent_id: AgentId,
    message: String,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.hub.register();
    let id = subscription.id();

    // Replies to this socket share the sink with broadcasts
    let (direct_tx, mut direct_rx) = mpsc::channel::<Message>(32);

    let send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                Some(frame) = direct_rx.recv() => frame,
                Some(message) = subscription.next() => match message.to_frame() {
                    Some(frame) => frame,
                    None => continue,
                },
                else => break,
            };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    // Agent turns run in order here so the read loop keeps serving pings and close
    let (turn_tx, turn_rx) = mpsc::channel::<Turn>(TURN_QUEUE);
    tokio::spawn(answer_turns(state.clone(), id, turn_rx, direct_tx.clone()));

    while let Some(Ok(msg)) = receiver.next().await {
        let reply = match msg {
            Message::Text(text) => match parse_frame(id, &text) {
                Some(ClientMessage::Ping) => ServerMessage::Pong.to_frame(),
                Some(ClientMessage::UserMessage {
                    user_id,
                    agent_id,
                    message,
                }) => {
                    state.hub.identify(id, user_id);
                    let turn = Turn {
                        user_id,
                        agent_id,
                        message,
                    };
                    match turn_tx.try_send(turn) {
                        Ok(()) => None,
                        Err(TrySendError::Full(turn)) => {
                            warn!(connection = %id, user_id = turn.user_id, "Turn queue full");
                            ServerMessage::error().to_frame()
                        }
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
                None => ServerMessage::error().to_frame(),
            },
            Message::Ping(data) => Some(Message::Pong(data)),
            Message::Close(_) => break,
            _ => None,
        };
        if let Some(frame) = reply {
            if direct_tx.send(frame).await.is_err() {
                break;
            }
        }
    }

    // The worker finishes its current turn and stops once the sink is gone
    drop(turn_tx);
    send_task.abort();
    state.hub.unregister(id);
}

fn parse_frame(id: ConnectionId, text: &str) -> Option<ClientMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!(connection = %id, error = %e, "Malformed frame");
            None
        }
    }
}

async fn answer_turns(
    state: Arc<AppState>,
    id: ConnectionId,
    mut turns: mpsc::Receiver<Turn>,
    replies: mpsc::Sender<Message>,
) {
    while let Some(turn) = turns.recv().await {
        let reply = match relay_user_message(
            &state,
            Some(id),
            turn.user_id,
            turn.agent_id,
            &turn.message,
        )
        .await
        {
            Ok(response) => ServerMessage::AgentResponse { response },
            Err(e) => {
                warn!(connection = %id, user_id = turn.user_id, error = %e, "User message failed");
                ServerMessage::error()
            }
        };
        if let Some(frame) = reply.to_frame() {
            if replies.send(frame).await.is_err() {
                break;
            }
        }
    }
}
