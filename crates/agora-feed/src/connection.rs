use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use agora_types::events::{FeedCommand, FeedEvent};

use crate::feed::ChangeFeed;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a fresh socket gets to present a valid token before we hang up.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single WebSocket connection: Identify handshake, then Ready,
/// then relay change events scoped to whatever conversation the client is
/// currently watching.
pub async fn handle_connection(socket: WebSocket, feed: ChangeFeed, jwt_secret: String) {
    let (mut sender, mut receiver) = socket.split();

    // Step 1: Wait for Identify command with JWT
    let (user_id, username) = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(id) => id,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to change feed", username, user_id);

    // Step 2: Send Ready event
    let ready = FeedEvent::Ready {
        user_id,
        username: username.clone(),
    };
    if sender
        .send(Message::Text(serde_json::to_string(&ready).unwrap().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut feed_rx = feed.subscribe();

    // The conversation this client has on screen right now. Events scoped to
    // any other conversation are dropped before they reach the socket.
    let scope: Arc<std::sync::RwLock<Option<Uuid>>> = Arc::new(std::sync::RwLock::new(None));
    let send_scope = scope.clone();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward scoped events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = feed_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Feed receiver lagged by {} events", n);
                            continue;
                        }
                        Err(_) => break,
                    };

                    let watching = *send_scope.read().expect("scope lock poisoned");
                    if !should_forward(&event, watching) {
                        continue;
                    }

                    let text = serde_json::to_string(&event).unwrap();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let username_recv = username.clone();
    let recv_scope = scope.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<FeedCommand>(&text) {
                    Ok(cmd) => handle_command(user_id, &username_recv, cmd, &recv_scope),
                    Err(e) => {
                        warn!(
                            "{} ({}) bad command: {} -- raw: {}",
                            username_recv,
                            user_id,
                            e,
                            &text[..text.len().min(200)]
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("{} ({}) disconnected from change feed", username, user_id);
}

/// Connection-level events always go out; conversation-scoped events only
/// when the client is watching exactly that conversation.
fn should_forward(event: &FeedEvent, watching: Option<Uuid>) -> bool {
    match event.conversation_id() {
        Some(conversation_id) => watching == Some(conversation_id),
        None => true,
    }
}

fn handle_command(
    user_id: Uuid,
    username: &str,
    cmd: FeedCommand,
    scope: &Arc<std::sync::RwLock<Option<Uuid>>>,
) {
    match cmd {
        FeedCommand::Identify { .. } => {} // Already handled

        // A new Subscribe replaces the previous one: the client watches at
        // most one conversation at a time.
        FeedCommand::Subscribe { conversation_id } => {
            info!(
                "{} ({}) watching conversation {}",
                username, user_id, conversation_id
            );
            *scope.write().expect("scope lock poisoned") = Some(conversation_id);
        }

        FeedCommand::Unsubscribe => {
            info!("{} ({}) stopped watching", username, user_id);
            *scope.write().expect("scope lock poisoned") = None;
        }
    }
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<(Uuid, String)> {
    use agora_types::api::Claims;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    let timeout = tokio::time::timeout(IDENTIFY_TIMEOUT, async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(FeedCommand::Identify { token }) =
                    serde_json::from_str::<FeedCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some((token_data.claims.sub, token_data.claims.username));
                }
            }
        }
        None
    });

    timeout.await.ok().flatten()
}
