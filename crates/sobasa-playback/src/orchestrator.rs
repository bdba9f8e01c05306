//! The orchestrator: owner of the session store and suppression set, and
//! the single place commands, backend events and scheduler ticks meet.

use crate::backend::{AudioBackend, ChatGateway, Directory};
use crate::config::OrchestratorConfig;
use crate::store::{PlaybackSession, SessionStore};
use crate::suppression::SuppressionSet;
use sobasa_types::{ChannelId, CommunityId, OutboundMessage};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Coordinates playback sessions across all communities.
///
/// Several instances can coexist (each owns its own stores), which is what
/// the tests rely on.
pub struct Orchestrator {
    pub(crate) config: OrchestratorConfig,
    pub(crate) sessions: SessionStore,
    pub(crate) suppression: SuppressionSet,
    /// Per-community locks serializing open/close sequences.
    lifecycle_locks: Mutex<HashMap<CommunityId, Arc<tokio::sync::Mutex<()>>>>,
    /// Per-community locks serializing filter read-apply-record cycles.
    filter_locks: Mutex<HashMap<CommunityId, Arc<tokio::sync::Mutex<()>>>>,
    pub(crate) backend: Arc<dyn AudioBackend>,
    pub(crate) gateway: Arc<dyn ChatGateway>,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) scheduler_started: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        backend: Arc<dyn AudioBackend>,
        gateway: Arc<dyn ChatGateway>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            suppression: SuppressionSet::new(),
            lifecycle_locks: Mutex::new(HashMap::new()),
            filter_locks: Mutex::new(HashMap::new()),
            backend,
            gateway,
            directory,
            scheduler_started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Copy of the community's current session.
    pub fn session(&self, community: CommunityId) -> Option<PlaybackSession> {
        self.sessions.get(community)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_suppressed(&self, community: CommunityId, room: ChannelId) -> bool {
        self.suppression.is_suppressed(community, room)
    }

    /// Flips the room's opt-out of autonomous joins. Returns whether the room
    /// is suppressed afterwards.
    pub fn toggle_suppression(&self, community: CommunityId, room: ChannelId) -> bool {
        let suppressed = self.suppression.toggle(community, room);
        tracing::info!(%community, %room, suppressed, "toggled ambient suppression");
        suppressed
    }

    pub(crate) fn lifecycle_lock(&self, community: CommunityId) -> Arc<tokio::sync::Mutex<()>> {
        community_lock(&self.lifecycle_locks, community)
    }

    pub(crate) fn filter_lock(&self, community: CommunityId) -> Arc<tokio::sync::Mutex<()>> {
        community_lock(&self.filter_locks, community)
    }

    /// Sends `message`, logging delivery failures. Never retried.
    pub(crate) async fn deliver(&self, channel: ChannelId, message: OutboundMessage) {
        if let Err(e) = self.gateway.send_message(channel, message).await {
            tracing::warn!(%channel, error = %e, "failed to deliver message");
        }
    }

    pub(crate) async fn reply(&self, channel: ChannelId, text: impl Into<String>) {
        self.deliver(channel, OutboundMessage::text(text)).await;
    }
}

fn community_lock(
    locks: &Mutex<HashMap<CommunityId, Arc<tokio::sync::Mutex<()>>>>,
    community: CommunityId,
) -> Arc<tokio::sync::Mutex<()>> {
    locks
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .entry(community)
        .or_default()
        .clone()
}
