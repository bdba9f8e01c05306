//! The gateway connection: identify, heartbeat, resume and dispatch.
//!
//! One task owns the socket. Dispatches are applied to the [`GuildCache`]
//! and forwarded as [`DiscordEvent`]s; voice-state requests arrive through a
//! [`GatewayHandle`]. After a disconnect the session is resumed when Discord
//! allows it and re-identified otherwise.

use crate::cache::GuildCache;
use crate::config::DiscordConfig;
use crate::dispatch::{translate, DiscordEvent};
use crate::error::DiscordError;
use crate::model::{
    self, GatewayPayload, Hello, OP_DISPATCH, OP_HEARTBEAT, OP_HEARTBEAT_ACK, OP_HELLO,
    OP_INVALID_SESSION, OP_RECONNECT,
};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;
use sobasa_types::{ChannelId, CommunityId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::Message;

/// Close codes after which reconnecting cannot succeed.
const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

/// Close codes that invalidate the session, forcing a fresh identify.
const SESSION_CLOSE_CODES: [u16; 2] = [4007, 4009];

/// Requests sent over the gateway on the bot's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCommand {
    /// Join `channel`, or leave voice when it is `None`.
    UpdateVoiceState {
        community: CommunityId,
        channel: Option<ChannelId>,
    },
}

/// Cloneable sender side of the gateway's command queue.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    commands: mpsc::UnboundedSender<GatewayCommand>,
}

impl GatewayHandle {
    /// Creates a handle and the receiver to pass to [`run_gateway`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GatewayCommand>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }

    pub fn join_voice(&self, community: CommunityId, room: ChannelId) -> Result<(), DiscordError> {
        self.send(GatewayCommand::UpdateVoiceState {
            community,
            channel: Some(room),
        })
    }

    pub fn leave_voice(&self, community: CommunityId) -> Result<(), DiscordError> {
        self.send(GatewayCommand::UpdateVoiceState {
            community,
            channel: None,
        })
    }

    fn send(&self, command: GatewayCommand) -> Result<(), DiscordError> {
        self.commands
            .send(command)
            .map_err(|_| DiscordError::GatewayGone)
    }
}

/// What survives a reconnect.
#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<String>,
    resume_url: Option<String>,
    seq: Option<u64>,
}

impl SessionState {
    fn forget(&mut self) {
        *self = Self::default();
    }
}

#[derive(Deserialize)]
struct ReadySession {
    session_id: String,
    #[serde(default)]
    resume_url: Option<String>,
    #[serde(default)]
    resume_gateway_url: Option<String>,
}

/// How a connection ended without an error.
enum Exit {
    Reconnect,
    Stop,
}

/// Runs the gateway until the command queue or the event receiver is
/// dropped, or Discord rejects the credentials.
pub async fn run_gateway(
    config: DiscordConfig,
    cache: Arc<GuildCache>,
    mut commands: mpsc::UnboundedReceiver<GatewayCommand>,
    events: mpsc::UnboundedSender<DiscordEvent>,
) {
    let mut session = SessionState::default();
    loop {
        match connect_once(&config, &cache, &mut commands, &events, &mut session).await {
            Ok(Exit::Stop) => {
                tracing::info!("gateway stopped");
                return;
            }
            Ok(Exit::Reconnect) => tracing::info!("gateway reconnecting"),
            Err(DiscordError::Closed { code, reason }) if FATAL_CLOSE_CODES.contains(&code) => {
                tracing::error!(code, %reason, "gateway closed with a fatal code; giving up");
                return;
            }
            Err(DiscordError::Closed { code, reason }) => {
                if SESSION_CLOSE_CODES.contains(&code) {
                    session.forget();
                }
                tracing::warn!(code, %reason, "gateway closed");
            }
            Err(e) => tracing::warn!(error = %e, "gateway connection failed"),
        }
        tokio::time::sleep(config.reconnect_delay()).await;
    }
}

fn encode(payload: &GatewayPayload) -> Result<Message, DiscordError> {
    Ok(Message::text(serde_json::to_string(payload)?))
}

async fn connect_once(
    config: &DiscordConfig,
    cache: &GuildCache,
    commands: &mut mpsc::UnboundedReceiver<GatewayCommand>,
    events: &mpsc::UnboundedSender<DiscordEvent>,
    session: &mut SessionState,
) -> Result<Exit, DiscordError> {
    let base = match (&session.session_id, &session.resume_url) {
        (Some(_), Some(url)) => url.clone(),
        _ => config.gateway_url.clone(),
    };
    let url = DiscordConfig::gateway_endpoint(&base);
    tracing::info!(%url, "connecting to gateway");
    let (ws, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut sink, mut stream) = ws.split();

    let interval = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let payload: GatewayPayload = serde_json::from_str(text.as_str())?;
                if payload.op == OP_HELLO {
                    let hello: Hello = serde_json::from_value(payload.d)?;
                    break Duration::from_millis(hello.heartbeat_interval);
                }
            }
            Some(Ok(Message::Close(frame))) => return Err(closed(frame)),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(Exit::Reconnect),
        }
    };

    let login = match &session.session_id {
        Some(id) => {
            tracing::info!(session = %id, seq = ?session.seq, "resuming gateway session");
            model::resume(&config.token, id, session.seq)
        }
        None => model::identify(&config.token, &config.status_text),
    };
    sink.send(encode(&login)?).await?;

    let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
    let mut next_beat = Instant::now() + interval.mul_f64(jitter);
    let mut acked = true;

    loop {
        tokio::select! {
            _ = sleep_until(next_beat) => {
                if !acked {
                    tracing::warn!("heartbeat not acknowledged; reconnecting");
                    return Ok(Exit::Reconnect);
                }
                sink.send(encode(&model::heartbeat(session.seq))?).await?;
                acked = false;
                next_beat = Instant::now() + interval;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(Exit::Stop);
                };
                let payload = match command {
                    GatewayCommand::UpdateVoiceState { community, channel } => {
                        tracing::debug!(%community, channel = ?channel, "voice state request");
                        model::voice_state_update(community, channel, config.self_deaf)
                    }
                };
                sink.send(encode(&payload)?).await?;
            }
            message = stream.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => return Err(closed(frame)),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(Exit::Reconnect),
                };
                let payload: GatewayPayload = match serde_json::from_str(text.as_str()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, "undecodable gateway frame");
                        continue;
                    }
                };
                match payload.op {
                    OP_DISPATCH => {
                        if payload.s.is_some() {
                            session.seq = payload.s;
                        }
                        let kind = payload.t.unwrap_or_default();
                        if kind == "READY" {
                            let ready: ReadySession = serde_json::from_value(payload.d.clone())?;
                            session.session_id = Some(ready.session_id);
                            session.resume_url = ready.resume_gateway_url.or(ready.resume_url);
                            sink.send(encode(&model::presence(&config.status_text))?).await?;
                        } else if kind == "RESUMED" {
                            tracing::info!("gateway session resumed");
                        }
                        match translate(cache, &kind, payload.d) {
                            Ok(translated) => {
                                for event in translated {
                                    if events.send(event).is_err() {
                                        return Ok(Exit::Stop);
                                    }
                                }
                            }
                            Err(e) => tracing::warn!(%kind, error = %e, "malformed dispatch"),
                        }
                    }
                    OP_HEARTBEAT => {
                        sink.send(encode(&model::heartbeat(session.seq))?).await?;
                    }
                    OP_HEARTBEAT_ACK => acked = true,
                    OP_RECONNECT => {
                        tracing::info!("gateway asked for a reconnect");
                        return Ok(Exit::Reconnect);
                    }
                    OP_INVALID_SESSION => {
                        if payload.d != serde_json::Value::Bool(true) {
                            session.forget();
                        }
                        tracing::warn!("gateway session invalidated");
                        return Ok(Exit::Reconnect);
                    }
                    op => tracing::trace!(op, "ignored gateway opcode"),
                }
            }
        }
    }
}

fn closed(frame: Option<tokio_tungstenite::tungstenite::protocol::CloseFrame>) -> DiscordError {
    match frame {
        Some(frame) => DiscordError::Closed {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_string(),
        },
        None => DiscordError::Closed {
            code: 1000,
            reason: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_reports_a_stopped_gateway() {
        let (handle, rx) = GatewayHandle::channel();
        handle.join_voice(CommunityId(1), ChannelId(2)).unwrap();
        drop(rx);
        assert!(matches!(
            handle.leave_voice(CommunityId(1)),
            Err(DiscordError::GatewayGone)
        ));
    }

    #[test]
    fn forgetting_clears_resume_state() {
        let mut session = SessionState {
            session_id: Some("s".to_string()),
            resume_url: Some("wss://r".to_string()),
            seq: Some(9),
        };
        session.forget();
        assert!(session.session_id.is_none());
        assert!(session.resume_url.is_none());
        assert!(session.seq.is_none());
    }
}
