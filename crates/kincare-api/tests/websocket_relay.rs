//! WebSocket relay over a real socket

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use kincare_agents::{
    ConversationContext, GeneratedReply, Handoff, HandoffContext, KeywordGenerator, MemoryQuiz,
    Persona, ResponseGenerator,
};
use kincare_api::{create_test_router, AppState, HubConfig};
use kincare_db::{seed_demo_data, MemoryStore, SeededHousehold};
use kincare_types::Memory;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Keyword replies that take a while to come back
struct SlowGenerator {
    inner: KeywordGenerator,
    delay: Duration,
}

#[async_trait]
impl ResponseGenerator for SlowGenerator {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn generate_response(
        &self,
        persona: &Persona,
        message: &str,
        context: &ConversationContext,
    ) -> GeneratedReply {
        tokio::time::sleep(self.delay).await;
        self.inner.generate_response(persona, message, context).await
    }

    async fn generate_handoff(
        &self,
        from: &Persona,
        to: &Persona,
        context: &HandoffContext,
    ) -> Handoff {
        self.inner.generate_handoff(from, to, context).await
    }

    async fn generate_memory_quiz(&self, memories: &[Memory]) -> MemoryQuiz {
        self.inner.generate_memory_quiz(memories).await
    }
}

async fn spawn_server() -> (String, Arc<AppState>, SeededHousehold) {
    spawn_server_with(Arc::new(KeywordGenerator::seeded(11))).await
}

async fn spawn_server_with(
    generator: Arc<dyn ResponseGenerator>,
) -> (String, Arc<AppState>, SeededHousehold) {
    let store = Arc::new(MemoryStore::new());
    let household = seed_demo_data(store.as_ref()).await.unwrap().unwrap();
    let state = Arc::new(AppState::new(store, generator, HubConfig::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_test_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("ws://{}/ws", addr), state, household)
}

async fn connect(url: &str, state: &AppState, expected: usize) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    // Registration happens after the upgrade completes on the server side
    for _ in 0..100 {
        if state.hub.connection_count() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.hub.connection_count(), expected);
    client
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_ping_pong() {
    let (url, state, _) = spawn_server().await;
    let mut client = connect(&url, &state, 1).await;

    send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(recv(&mut client).await, json!({"type": "pong"}));
}

#[tokio::test]
async fn test_malformed_frames_get_error() {
    let (url, state, _) = spawn_server().await;
    let mut client = connect(&url, &state, 1).await;

    client.send(Message::Text("not json".into())).await.unwrap();
    let reply = recv(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Failed to process message");

    send(&mut client, json!({"type": "dance"})).await;
    assert_eq!(recv(&mut client).await["type"], "error");

    // Still usable afterwards
    send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(recv(&mut client).await["type"], "pong");
}

#[tokio::test]
async fn test_unknown_user_gets_error() {
    let (url, state, _) = spawn_server().await;
    let mut client = connect(&url, &state, 1).await;

    send(
        &mut client,
        json!({"type": "user_message", "userId": 999, "agentId": "grace", "message": "hi"}),
    )
    .await;
    assert_eq!(recv(&mut client).await["type"], "error");
}

#[tokio::test]
async fn test_handoff_reaches_other_clients_only() {
    let (url, state, household) = spawn_server().await;
    let mut margaret = connect(&url, &state, 1).await;
    let mut sarah = connect(&url, &state, 2).await;

    send(
        &mut margaret,
        json!({
            "type": "user_message",
            "userId": household.elderly_user_id,
            "agentId": "grace",
            "message": "I miss everyone, I feel lonely"
        }),
    )
    .await;

    let reply = recv(&mut margaret).await;
    assert_eq!(reply["type"], "agent_response");
    assert_eq!(reply["response"]["emotionalState"], "lonely");
    assert_eq!(reply["response"]["agentCommunication"]["toAgent"], "alex");

    let notice = recv(&mut sarah).await;
    assert_eq!(notice["type"], "agent_communication");
    assert_eq!(notice["fromAgent"], "grace");
    assert_eq!(notice["toAgent"], "alex");
    assert_eq!(notice["priority"], "high");

    // The sender never sees its own handoff
    send(&mut margaret, json!({"type": "ping"})).await;
    assert_eq!(recv(&mut margaret).await["type"], "pong");
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let (url, state, _) = spawn_server().await;
    let mut client = connect(&url, &state, 1).await;
    client.close(None).await.unwrap();

    for _ in 0..100 {
        if state.hub.connection_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.hub.connection_count(), 0);
}

#[tokio::test]
async fn test_slow_reply_does_not_block_ping() {
    let (url, state, household) = spawn_server_with(Arc::new(SlowGenerator {
        inner: KeywordGenerator::seeded(11),
        delay: Duration::from_millis(1500),
    }))
    .await;
    let mut client = connect(&url, &state, 1).await;

    send(
        &mut client,
        json!({
            "type": "user_message",
            "userId": household.elderly_user_id,
            "agentId": "grace",
            "message": "Good morning"
        }),
    )
    .await;
    send(&mut client, json!({"type": "ping"})).await;

    let started = std::time::Instant::now();
    assert_eq!(recv(&mut client).await["type"], "pong");
    assert!(started.elapsed() < Duration::from_millis(500));

    let reply = recv(&mut client).await;
    assert_eq!(reply["type"], "agent_response");
    assert!(!reply["response"]["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_queued_turns_answer_in_order() {
    let (url, state, household) = spawn_server_with(Arc::new(SlowGenerator {
        inner: KeywordGenerator::seeded(11),
        delay: Duration::from_millis(100),
    }))
    .await;
    let mut client = connect(&url, &state, 1).await;

    for message in ["I feel lonely today", "Can we look at a photo?"] {
        send(
            &mut client,
            json!({
                "type": "user_message",
                "userId": household.elderly_user_id,
                "agentId": "grace",
                "message": message
            }),
        )
        .await;
    }

    let first = recv(&mut client).await;
    assert_eq!(first["response"]["memoryTags"][0], "emotional_support");
    let second = recv(&mut client).await;
    assert_eq!(second["response"]["memoryTags"][0], "photo_sharing");
}
