//! Event WebSocket of a Lavalink node.
//!
//! The socket is kept open for the life of the process. Every disconnect is
//! followed by a reconnect after the configured delay; the last session id
//! is offered on reconnect so the node can resume its players.

use crate::client::LavalinkClient;
use crate::error::LavalinkError;
use crate::model::{Event, IncomingMessage};
use futures_util::{Stream, StreamExt};
use sobasa_types::UserId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// What the event loop reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// The node accepted the socket. `resumed` is set when it kept the
    /// players of a previous session.
    Ready { session_id: String, resumed: bool },
    Disconnected { reason: String },
    Reconnecting,
    Error { error: String },
    Player(Event),
}

fn header(value: &str) -> Result<HeaderValue, LavalinkError> {
    HeaderValue::from_str(value).map_err(|e| LavalinkError::Config(e.to_string()))
}

/// Runs the event socket until `events` is dropped.
pub async fn run_node(
    client: Arc<LavalinkClient>,
    user_id: UserId,
    events: mpsc::UnboundedSender<NodeEvent>,
) {
    let node = client.config().node_id.clone();
    loop {
        tracing::info!(%node, url = %client.config().websocket_url(), "connecting to lavalink");
        let outcome = match connect(&client, user_id).await {
            Ok(ws) => NodeEvent::Disconnected {
                reason: pump(&client, ws, &events).await,
            },
            Err(e) => {
                tracing::warn!(%node, error = %e, "lavalink connect failed");
                NodeEvent::Error {
                    error: e.to_string(),
                }
            }
        };

        if events.send(outcome).is_err() || events.send(NodeEvent::Reconnecting).is_err() {
            tracing::info!(%node, "lavalink event receiver dropped; stopping");
            return;
        }
        tokio::time::sleep(client.config().reconnect_delay()).await;
    }
}

async fn connect(
    client: &LavalinkClient,
    user_id: UserId,
) -> Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    LavalinkError,
> {
    let config = client.config();
    let mut request = config.websocket_url().into_client_request()?;
    let headers = request.headers_mut();
    headers.insert(AUTHORIZATION, header(&config.password)?);
    headers.insert("user-id", HeaderValue::from(user_id.get()));
    headers.insert("client-name", header(&config.client_name)?);
    if let Some(session_id) = client.session_id() {
        headers.insert("session-id", header(&session_id)?);
    }

    let (ws, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(ws)
}

/// Reads messages until the socket closes. Returns the close reason.
async fn pump<S>(
    client: &LavalinkClient,
    mut ws: S,
    events: &mpsc::UnboundedSender<NodeEvent>,
) -> String
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let node = &client.config().node_id;
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<IncomingMessage>(text.as_str()) {
                    Ok(message) => {
                        if let Some(event) = handle(client, message) {
                            let _ = events.send(event);
                        }
                    }
                    Err(e) => tracing::warn!(%node, error = %e, "undecodable lavalink message"),
                }
            }
            Ok(Message::Close(frame)) => {
                return match frame {
                    Some(frame) => format!("{} {}", u16::from(frame.code), frame.reason.as_str()),
                    None => "closed without a frame".to_string(),
                };
            }
            Ok(_) => {}
            Err(e) => return e.to_string(),
        }
    }
    "stream ended".to_string()
}

fn handle(client: &LavalinkClient, message: IncomingMessage) -> Option<NodeEvent> {
    let node = &client.config().node_id;
    match message {
        IncomingMessage::Ready(ready) => {
            tracing::info!(
                %node,
                session = %ready.session_id,
                resumed = ready.resumed,
                "lavalink ready"
            );
            client.set_session_id(Some(ready.session_id.clone()));
            Some(NodeEvent::Ready {
                session_id: ready.session_id,
                resumed: ready.resumed,
            })
        }
        IncomingMessage::PlayerUpdate(update) => {
            tracing::trace!(
                %node,
                guild = %update.guild_id,
                position = update.state.position,
                connected = update.state.connected,
                "player update"
            );
            None
        }
        IncomingMessage::Stats(stats) => {
            tracing::debug!(
                %node,
                players = stats.players,
                playing = stats.playing_players,
                uptime_ms = stats.uptime,
                "lavalink stats"
            );
            None
        }
        IncomingMessage::Event(event) => Some(NodeEvent::Player(event)),
    }
}
