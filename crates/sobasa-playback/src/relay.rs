//! Forwarding of backend and gateway lifecycle events.

use crate::command::InboundMessage;
use crate::orchestrator::Orchestrator;
use sobasa_types::message::escape_emphasis;
use sobasa_types::{ChannelId, CommunityId, Embed, EmbedAuthor, Track};
use std::sync::Arc;

/// Why a track stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

impl TrackEndReason {
    /// Whether the player is free to move on to the next track.
    pub fn may_start_next(self) -> bool {
        matches!(self, Self::Finished | Self::LoadFailed)
    }
}

/// Notifications from the audio backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    NodeConnected { node: String },
    NodeDisconnected { node: String, reason: String },
    NodeReconnecting { node: String },
    NodeCreated { node: String },
    NodeDestroyed { node: String },
    NodeResumed { node: String, players: usize },
    NodeError { node: String, error: String },
    SocketClosed {
        community: CommunityId,
        code: u16,
        reason: String,
        by_remote: bool,
    },
    TrackStart { community: CommunityId, track: Track },
    TrackEnd {
        community: CommunityId,
        track: Track,
        reason: TrackEndReason,
    },
    TrackError {
        community: CommunityId,
        track: Track,
        message: String,
    },
    TrackStuck {
        community: CommunityId,
        track: Track,
        threshold_ms: u64,
    },
}

/// Notifications from the chat gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Message(InboundMessage),
    RoomDeleted {
        community: CommunityId,
        room: ChannelId,
    },
    CommunityDeleted { community: CommunityId },
    /// The bot's own voice room changed; `None` once it was disconnected.
    BotVoiceChanged {
        community: CommunityId,
        room: Option<ChannelId>,
    },
    /// A room's human occupancy changed.
    OccupancyChanged {
        community: CommunityId,
        room: ChannelId,
        humans: usize,
    },
}

/// Builds the "Now Playing" notification for `track`. Returns `None` when
/// the track carries no artwork.
pub fn now_playing(track: &Track) -> Option<Embed> {
    let artwork = track.info.artwork_url.clone()?;
    let author = track.requester.as_ref().map(|requester| EmbedAuthor {
        name: format!("Requested by {}", requester.username),
        icon_url: requester.avatar_url(),
    });
    Some(Embed {
        title: "Now Playing".to_string(),
        description: format!(
            "{} **-** {}",
            escape_emphasis(&track.info.author),
            escape_emphasis(&track.info.title)
        ),
        author,
        thumbnail_url: Some(artwork),
    })
}

impl Orchestrator {
    /// Handles one backend event.
    pub async fn handle_backend_event(self: &Arc<Self>, event: BackendEvent) {
        match event {
            BackendEvent::NodeConnected { node } => {
                tracing::info!(%node, "audio node connected");
                self.start_scheduler();
            }
            BackendEvent::NodeDisconnected { node, reason } => {
                tracing::info!(%node, %reason, "audio node disconnected");
            }
            BackendEvent::NodeReconnecting { node } => {
                tracing::info!(%node, "audio node reconnecting");
            }
            BackendEvent::NodeCreated { node } => {
                tracing::info!(%node, "audio node created");
            }
            BackendEvent::NodeDestroyed { node } => {
                tracing::info!(%node, "audio node destroyed");
            }
            BackendEvent::NodeResumed { node, players } => {
                tracing::info!(%node, players, "audio node resumed");
            }
            BackendEvent::NodeError { node, error } => {
                tracing::error!(%node, %error, "audio node error");
            }
            BackendEvent::SocketClosed {
                community,
                code,
                reason,
                by_remote,
            } => {
                tracing::info!(%community, code, %reason, by_remote, "voice socket closed");
            }
            BackendEvent::TrackStart { community, track } => {
                self.on_track_start(community, track).await;
            }
            BackendEvent::TrackEnd {
                community,
                track,
                reason,
            } => {
                self.on_track_end(community, &track, reason);
            }
            BackendEvent::TrackError {
                community,
                track,
                message,
            } => {
                tracing::error!(%community, title = %track.info.title, %message, "track error");
            }
            BackendEvent::TrackStuck {
                community,
                track,
                threshold_ms,
            } => {
                tracing::warn!(%community, title = %track.info.title, threshold_ms, "track stuck");
            }
        }
    }

    /// Handles one gateway event.
    pub async fn handle_gateway_event(self: &Arc<Self>, event: GatewayEvent) {
        match event {
            GatewayEvent::Message(message) => self.handle_message(message).await,
            GatewayEvent::RoomDeleted { community, room } => {
                self.suppression.clear(community, room);
                let Some(session) = self.sessions.get(community) else {
                    return;
                };
                if session.voice_room == room {
                    self.close_session(community, "Voice channel deleted").await;
                } else if session.text_channel == room {
                    self.sessions.update(community, session.id, |s| {
                        s.text_channel = s.voice_room;
                    });
                    tracing::info!(
                        %community,
                        %room,
                        "text channel deleted; rebound to voice room"
                    );
                }
            }
            GatewayEvent::CommunityDeleted { community } => {
                self.suppression.clear_community(community);
                self.close_session(community, "Guild deleted").await;
            }
            GatewayEvent::BotVoiceChanged { community, room } => {
                self.on_bot_voice_changed(community, room).await;
            }
            GatewayEvent::OccupancyChanged {
                community,
                room,
                humans,
            } => {
                if humans > 0 {
                    return;
                }
                if self.suppression.clear(community, room) {
                    tracing::info!(%community, %room, "room emptied; suppression cleared");
                }
                let bound = self
                    .sessions
                    .get(community)
                    .is_some_and(|s| s.voice_room == room);
                if bound {
                    self.close_session(community, "Everyone left the voice channel")
                        .await;
                }
            }
        }
    }

    /// Follows the bot's own voice connection. Sessions still joining are
    /// left alone: the echo of a predecessor's leave can arrive after the
    /// successor was created.
    async fn on_bot_voice_changed(&self, community: CommunityId, room: Option<ChannelId>) {
        let Some(session) = self.sessions.get(community) else {
            return;
        };
        if !session.connected {
            return;
        }
        match room {
            None => {
                self.close_if_current(community, session.id, "Disconnected from the voice channel")
                    .await;
            }
            Some(room) if room != session.voice_room => {
                self.sessions.update(community, session.id, |s| s.voice_room = room);
                tracing::info!(
                    %community,
                    from = %session.voice_room,
                    to = %room,
                    "bot was moved; session rebound"
                );
            }
            Some(_) => {}
        }
    }

    async fn on_track_start(&self, community: CommunityId, track: Track) {
        let Some(session) = self.sessions.get(community) else {
            tracing::debug!(%community, "track started without a session");
            return;
        };

        // Prefer our own copy: it carries metadata overrides and the requester.
        let track = match session.current {
            Some(current) if current.encoded == track.encoded => current,
            _ => track,
        };
        self.sessions.update(community, session.id, |s| {
            s.playing = true;
        });

        if let Some(embed) = now_playing(&track) {
            self.deliver(session.text_channel, embed.into()).await;
        }
    }

    fn on_track_end(
        self: &Arc<Self>,
        community: CommunityId,
        track: &Track,
        reason: TrackEndReason,
    ) {
        if !reason.may_start_next() {
            return;
        }
        let Some(session) = self.sessions.get(community) else {
            return;
        };

        let idle = self
            .sessions
            .update(community, session.id, |s| {
                if s.current.as_ref().is_some_and(|c| c.encoded == track.encoded) {
                    s.current = None;
                    s.playing = false;
                }
                !s.playing && s.queued.is_none()
            })
            .unwrap_or(false);
        if !idle {
            return;
        }

        let orchestrator = Arc::clone(self);
        let delay = self.config.playback.idle_destroy();
        let id = session.id;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            orchestrator
                .close_if_idle(community, id, "Queue has ended")
                .await;
        });
    }
}
