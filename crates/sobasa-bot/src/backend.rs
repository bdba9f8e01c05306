//! The audio backend: Lavalink players joined to Discord voice.
//!
//! Joining voice is a handshake across both services. The bot asks the
//! gateway to join a room, Discord answers with a voice session id and a
//! voice server, and both are forwarded to the Lavalink player. `connect`
//! completes once Lavalink has accepted them.

use async_trait::async_trait;
use sobasa_discord::GatewayHandle;
use sobasa_lavalink::{LavalinkClient, LavalinkError, UpdatePlayer, VoiceState};
use sobasa_playback::{AudioBackend, BackendError, PlayOptions, SessionBinding};
use sobasa_types::{ChannelId, CommunityId, FilterChainState, Requester, Track};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

fn backend_error(e: LavalinkError) -> BackendError {
    match e {
        LavalinkError::NotReady => BackendError::NotReady,
        LavalinkError::Status { status, message } => BackendError::Rejected { status, message },
        other => BackendError::Request(other.to_string()),
    }
}

/// Voice credentials collected for one community.
#[derive(Debug, Default)]
struct PendingVoice {
    session_id: Option<String>,
    server: Option<(String, String)>,
    waiters: Vec<oneshot::Sender<()>>,
}

impl PendingVoice {
    fn ready(&self) -> Option<VoiceState> {
        let session_id = self.session_id.clone()?;
        let (token, endpoint) = self.server.clone()?;
        Some(VoiceState {
            token,
            endpoint,
            session_id,
        })
    }
}

pub struct LavalinkBackend {
    lavalink: Arc<LavalinkClient>,
    gateway: GatewayHandle,
    voice: Mutex<HashMap<CommunityId, PendingVoice>>,
}

impl LavalinkBackend {
    pub fn new(lavalink: Arc<LavalinkClient>, gateway: GatewayHandle) -> Self {
        Self {
            lavalink,
            gateway,
            voice: Mutex::new(HashMap::new()),
        }
    }

    /// Records the bot's voice session. `room` is `None` once the bot has
    /// left voice; the stale credentials are dropped but a pending `connect`
    /// keeps waiting for the next join.
    pub async fn on_voice_session(
        &self,
        community: CommunityId,
        room: Option<ChannelId>,
        session_id: String,
    ) {
        {
            let mut voice = self.voice.lock().unwrap_or_else(|e| e.into_inner());
            let pending = voice.entry(community).or_default();
            if room.is_none() {
                pending.session_id = None;
                pending.server = None;
                if pending.waiters.is_empty() {
                    voice.remove(&community);
                }
                tracing::debug!(%community, "left voice");
                return;
            }
            pending.session_id = Some(session_id);
        }
        self.forward(community).await;
    }

    /// Records the voice server assigned to the bot's connection.
    pub async fn on_voice_server(&self, community: CommunityId, token: String, endpoint: String) {
        self.voice
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(community)
            .or_default()
            .server = Some((token, endpoint));
        self.forward(community).await;
    }

    /// Sends complete credentials to the player and releases any waiting
    /// `connect`. A rejected update drops the waiters, failing their
    /// `connect`.
    async fn forward(&self, community: CommunityId) {
        let (state, waiters) = {
            let mut voice = self.voice.lock().unwrap_or_else(|e| e.into_inner());
            let Some(pending) = voice.get_mut(&community) else {
                return;
            };
            let Some(state) = pending.ready() else {
                return;
            };
            (state, std::mem::take(&mut pending.waiters))
        };

        let update = UpdatePlayer {
            voice: Some(state),
            ..UpdatePlayer::default()
        };
        match self.lavalink.update_player(community, &update).await {
            Ok(()) => {
                tracing::debug!(%community, "voice credentials forwarded");
                for waiter in waiters {
                    let _ = waiter.send(());
                }
            }
            Err(e) => {
                tracing::warn!(%community, error = %e, "lavalink rejected voice credentials");
            }
        }
    }

    async fn update(
        &self,
        community: CommunityId,
        update: UpdatePlayer,
    ) -> Result<(), BackendError> {
        self.lavalink
            .update_player(community, &update)
            .await
            .map_err(backend_error)
    }
}

#[async_trait]
impl AudioBackend for LavalinkBackend {
    async fn create_session(&self, binding: &SessionBinding) -> Result<(), BackendError> {
        if self.lavalink.session_id().is_none() {
            return Err(BackendError::NotReady);
        }
        self.voice
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(binding.community)
            .or_default();
        Ok(())
    }

    async fn connect(&self, binding: &SessionBinding) -> Result<(), BackendError> {
        let (tx, rx) = oneshot::channel();
        self.voice
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(binding.community)
            .or_default()
            .waiters
            .push(tx);

        self.gateway
            .join_voice(binding.community, binding.voice_room)
            .map_err(|e| BackendError::Voice(e.to_string()))?;
        rx.await
            .map_err(|_| BackendError::Voice("voice handshake abandoned".to_string()))
    }

    async fn destroy(&self, community: CommunityId, reason: &str) -> Result<(), BackendError> {
        tracing::debug!(%community, reason, "destroying player");
        let destroyed = self
            .lavalink
            .destroy_player(community)
            .await
            .map_err(backend_error);
        let left = self
            .gateway
            .leave_voice(community)
            .map_err(|e| BackendError::Voice(e.to_string()));
        self.voice
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&community);
        destroyed.and(left)
    }

    async fn search(&self, query: &str, requester: &Requester) -> Result<Vec<Track>, BackendError> {
        let tracks = self
            .lavalink
            .load_tracks(query)
            .await
            .and_then(|result| result.into_tracks())
            .map_err(backend_error)?;
        Ok(tracks
            .into_iter()
            .map(|mut track| {
                track.requester = Some(requester.clone());
                track
            })
            .collect())
    }

    async fn play(
        &self,
        community: CommunityId,
        track: &Track,
        options: PlayOptions,
    ) -> Result<(), BackendError> {
        let update = UpdatePlayer {
            volume: Some(options.volume),
            position: (options.start_ms > 0).then_some(options.start_ms),
            paused: Some(options.paused),
            ..UpdatePlayer::play(track)
        };
        self.update(community, update).await
    }

    async fn seek(&self, community: CommunityId, position_ms: u64) -> Result<(), BackendError> {
        self.update(
            community,
            UpdatePlayer {
                position: Some(position_ms),
                ..UpdatePlayer::default()
            },
        )
        .await
    }

    async fn set_volume(&self, community: CommunityId, volume: u16) -> Result<(), BackendError> {
        self.update(
            community,
            UpdatePlayer {
                volume: Some(volume),
                ..UpdatePlayer::default()
            },
        )
        .await
    }

    async fn apply_filters(
        &self,
        community: CommunityId,
        filters: &FilterChainState,
    ) -> Result<(), BackendError> {
        self.update(
            community,
            UpdatePlayer {
                filters: Some(filters.into()),
                ..UpdatePlayer::default()
            },
        )
        .await
    }
}
