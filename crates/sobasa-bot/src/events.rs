//! Pumps carrying gateway and node events into the orchestrator.

use crate::backend::LavalinkBackend;
use sobasa_discord::DiscordEvent;
use sobasa_lavalink::{run_node, EndReason, Event, LavalinkClient, NodeEvent};
use sobasa_playback::{BackendEvent, Orchestrator, TrackEndReason};
use std::sync::Arc;
use tokio::sync::mpsc;

fn end_reason(reason: EndReason) -> TrackEndReason {
    match reason {
        EndReason::Finished => TrackEndReason::Finished,
        EndReason::LoadFailed => TrackEndReason::LoadFailed,
        EndReason::Stopped => TrackEndReason::Stopped,
        EndReason::Replaced => TrackEndReason::Replaced,
        EndReason::Cleanup => TrackEndReason::Cleanup,
    }
}

/// Translates a node event for the orchestrator. `players` is the number of
/// live sessions, reported when the node resumes.
pub fn backend_events(node: &str, event: NodeEvent, players: usize) -> Vec<BackendEvent> {
    let node = node.to_string();
    match event {
        NodeEvent::Ready { resumed, .. } => {
            let mut events = vec![BackendEvent::NodeConnected { node: node.clone() }];
            if resumed {
                events.push(BackendEvent::NodeResumed { node, players });
            }
            events
        }
        NodeEvent::Disconnected { reason } => vec![BackendEvent::NodeDisconnected { node, reason }],
        NodeEvent::Reconnecting => vec![BackendEvent::NodeReconnecting { node }],
        NodeEvent::Error { error } => vec![BackendEvent::NodeError { node, error }],
        NodeEvent::Player(event) => vec![player_event(event)],
    }
}

fn player_event(event: Event) -> BackendEvent {
    match event {
        Event::TrackStart { guild_id, track } => BackendEvent::TrackStart {
            community: guild_id,
            track: track.into_track(),
        },
        Event::TrackEnd {
            guild_id,
            track,
            reason,
        } => BackendEvent::TrackEnd {
            community: guild_id,
            track: track.into_track(),
            reason: end_reason(reason),
        },
        Event::TrackException {
            guild_id,
            track,
            exception,
        } => BackendEvent::TrackError {
            community: guild_id,
            track: track.into_track(),
            message: exception.describe(),
        },
        Event::TrackStuck {
            guild_id,
            track,
            threshold_ms,
        } => BackendEvent::TrackStuck {
            community: guild_id,
            track: track.into_track(),
            threshold_ms,
        },
        Event::WebSocketClosed {
            guild_id,
            code,
            reason,
            by_remote,
        } => BackendEvent::SocketClosed {
            community: guild_id,
            code,
            reason,
            by_remote,
        },
    }
}

/// Feeds node events to the orchestrator until every sender is gone.
pub async fn pump_node(
    node: String,
    orchestrator: Arc<Orchestrator>,
    mut events: mpsc::UnboundedReceiver<NodeEvent>,
) {
    orchestrator
        .handle_backend_event(BackendEvent::NodeCreated { node: node.clone() })
        .await;
    while let Some(event) = events.recv().await {
        for event in backend_events(&node, event, orchestrator.session_count()) {
            orchestrator.handle_backend_event(event).await;
        }
    }
    orchestrator
        .handle_backend_event(BackendEvent::NodeDestroyed { node })
        .await;
}

/// Feeds gateway events to the orchestrator and the voice handshake.
///
/// The Lavalink socket needs the bot's user id, so the node is started on
/// the first READY and left running across gateway reconnects.
pub async fn pump_discord(
    orchestrator: Arc<Orchestrator>,
    backend: Arc<LavalinkBackend>,
    lavalink: Arc<LavalinkClient>,
    node_events: mpsc::UnboundedSender<NodeEvent>,
    mut events: mpsc::UnboundedReceiver<DiscordEvent>,
) {
    let mut node_events = Some(node_events);
    while let Some(event) = events.recv().await {
        match event {
            DiscordEvent::Ready { user } => {
                tracing::info!(user = %user.username, id = %user.id, "logged in");
                if let Some(sender) = node_events.take() {
                    tokio::spawn(run_node(Arc::clone(&lavalink), user.id, sender));
                }
            }
            DiscordEvent::VoiceSession {
                community,
                channel,
                session_id,
            } => backend.on_voice_session(community, channel, session_id).await,
            DiscordEvent::VoiceServer {
                community,
                token,
                endpoint,
            } => backend.on_voice_server(community, token, endpoint).await,
            DiscordEvent::Gateway(event) => {
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move { orchestrator.handle_gateway_event(event).await });
            }
        }
    }
    tracing::info!("gateway event stream ended");
}
