//! Seams to the collaborators the orchestrator drives: the audio backend,
//! the chat gateway's outbound side, and the gateway's cached view of
//! communities.

use crate::error::{BackendError, DeliveryError};
use async_trait::async_trait;
use sobasa_types::{
    ChannelId, CommunityId, CommunitySnapshot, FilterChainState, OutboundMessage, Requester,
    Track,
};

/// Default playback volume.
pub const DEFAULT_VOLUME: u16 = 100;

/// Where a session renders audio and where it reports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBinding {
    pub community: CommunityId,
    pub voice_room: ChannelId,
    pub text_channel: ChannelId,
}

/// Parameters for starting playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    pub volume: u16,
    pub start_ms: u64,
    pub paused: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            start_ms: 0,
            paused: false,
        }
    }
}

/// The remote audio renderer. One backend player exists per community.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Prepares a player bound to `binding`. Does not join voice.
    async fn create_session(&self, binding: &SessionBinding) -> Result<(), BackendError>;

    /// Asks the platform to join the voice room. Completion is asynchronous.
    async fn connect(&self, binding: &SessionBinding) -> Result<(), BackendError>;

    /// Tears the player down and leaves voice.
    async fn destroy(&self, community: CommunityId, reason: &str) -> Result<(), BackendError>;

    /// Resolves `query` into playable tracks, tagged with `requester`.
    async fn search(&self, query: &str, requester: &Requester) -> Result<Vec<Track>, BackendError>;

    async fn play(
        &self,
        community: CommunityId,
        track: &Track,
        options: PlayOptions,
    ) -> Result<(), BackendError>;

    async fn seek(&self, community: CommunityId, position_ms: u64) -> Result<(), BackendError>;

    async fn set_volume(&self, community: CommunityId, volume: u16) -> Result<(), BackendError>;

    /// Replaces the player's whole filter chain with `filters`.
    async fn apply_filters(
        &self,
        community: CommunityId,
        filters: &FilterChainState,
    ) -> Result<(), BackendError>;
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError>;
}

/// The gateway's live view of communities, read synchronously.
pub trait Directory: Send + Sync {
    /// All communities the bot is a member of.
    fn communities(&self) -> Vec<CommunityId>;

    /// Current snapshot of a community's rooms and occupants.
    fn snapshot(&self, community: CommunityId) -> Option<CommunitySnapshot>;

    /// The bot's own identity, once the gateway is ready.
    fn current_user(&self) -> Option<Requester>;
}
