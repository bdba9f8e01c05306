#![allow(dead_code)]

use async_trait::async_trait;
use sobasa_playback::{
    AudioBackend, BackendError, ChatGateway, DeliveryError, Directory, InboundMessage,
    Orchestrator, OrchestratorConfig, PlayOptions, SessionBinding,
};
use sobasa_types::{
    ChannelId, ChannelKind, CommunityId, CommunitySnapshot, FilterChainState, Occupant,
    OutboundMessage, Requester, RoomSnapshot, Track, TrackInfo, UserId,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TRACK_LENGTH_MS: u64 = 120_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(CommunityId, ChannelId),
    Connect(CommunityId, ChannelId),
    Destroy(CommunityId, String),
    Search(String, UserId),
    Play(CommunityId, String, PlayOptions),
    Seek(CommunityId, u64),
    Volume(CommunityId, u16),
    Filters(CommunityId, FilterChainState),
}

#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<Call>>,
    pub fail_play: AtomicBool,
    pub fail_filters: AtomicBool,
    pub hang_connect: AtomicBool,
    /// Communities whose `create_session` is rejected.
    pub reject_create: Mutex<HashSet<CommunityId>>,
    pub play_delay_ms: AtomicU64,
    pub filters_delay_ms: AtomicU64,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    async fn create_session(&self, binding: &SessionBinding) -> Result<(), BackendError> {
        self.record(Call::Create(binding.community, binding.voice_room));
        if self.reject_create.lock().unwrap().contains(&binding.community) {
            return Err(BackendError::Rejected {
                status: 400,
                message: "guild unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn connect(&self, binding: &SessionBinding) -> Result<(), BackendError> {
        self.record(Call::Connect(binding.community, binding.voice_room));
        if self.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn destroy(&self, community: CommunityId, reason: &str) -> Result<(), BackendError> {
        self.record(Call::Destroy(community, reason.to_string()));
        Ok(())
    }

    async fn search(&self, query: &str, requester: &Requester) -> Result<Vec<Track>, BackendError> {
        self.record(Call::Search(query.to_string(), requester.id));
        Ok(vec![Track {
            encoded: format!("enc:{query}"),
            info: TrackInfo {
                identifier: query.to_string(),
                title: query.to_string(),
                author: "Unknown artist".to_string(),
                length: TRACK_LENGTH_MS,
                is_seekable: true,
                ..TrackInfo::default()
            },
            requester: None,
        }])
    }

    async fn play(
        &self,
        community: CommunityId,
        track: &Track,
        options: PlayOptions,
    ) -> Result<(), BackendError> {
        self.record(Call::Play(community, track.encoded.clone(), options));
        delay(&self.play_delay_ms).await;
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                status: 500,
                message: "player exploded".to_string(),
            });
        }
        Ok(())
    }

    async fn seek(&self, community: CommunityId, position_ms: u64) -> Result<(), BackendError> {
        self.record(Call::Seek(community, position_ms));
        Ok(())
    }

    async fn set_volume(&self, community: CommunityId, volume: u16) -> Result<(), BackendError> {
        self.record(Call::Volume(community, volume));
        Ok(())
    }

    async fn apply_filters(
        &self,
        community: CommunityId,
        filters: &FilterChainState,
    ) -> Result<(), BackendError> {
        self.record(Call::Filters(community, filters.clone()));
        delay(&self.filters_delay_ms).await;
        if self.fail_filters.load(Ordering::SeqCst) {
            return Err(BackendError::Request("connection reset".to_string()));
        }
        Ok(())
    }
}

async fn delay(ms: &AtomicU64) {
    let ms = ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub sent: Mutex<Vec<(ChannelId, OutboundMessage)>>,
}

impl FakeGateway {
    pub fn sent(&self) -> Vec<(ChannelId, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|(_, message)| match message {
            OutboundMessage::Text { content } => Some(content),
            OutboundMessage::Embed { .. } => None,
        })
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((channel, message));
        Ok(())
    }
}

pub struct FakeDirectory {
    pub communities: Mutex<Vec<CommunitySnapshot>>,
    pub bot: Option<Requester>,
}

impl FakeDirectory {
    pub fn new(communities: Vec<CommunitySnapshot>) -> Self {
        Self {
            communities: Mutex::new(communities),
            bot: Some(bot()),
        }
    }
}

impl Directory for FakeDirectory {
    fn communities(&self) -> Vec<CommunityId> {
        self.communities.lock().unwrap().iter().map(|c| c.id).collect()
    }

    fn snapshot(&self, community: CommunityId) -> Option<CommunitySnapshot> {
        self.communities
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == community)
            .cloned()
    }

    fn current_user(&self) -> Option<Requester> {
        self.bot.clone()
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub backend: Arc<FakeBackend>,
    pub gateway: Arc<FakeGateway>,
    pub directory: Arc<FakeDirectory>,
}

pub fn harness(communities: Vec<CommunitySnapshot>) -> Harness {
    harness_with(OrchestratorConfig::default(), communities)
}

pub fn harness_with(config: OrchestratorConfig, communities: Vec<CommunitySnapshot>) -> Harness {
    let backend = Arc::new(FakeBackend::default());
    let gateway = Arc::new(FakeGateway::default());
    let directory = Arc::new(FakeDirectory::new(communities));
    let orchestrator = Arc::new(Orchestrator::new(
        config,
        backend.clone(),
        gateway.clone(),
        directory.clone(),
    ));
    Harness {
        orchestrator,
        backend,
        gateway,
        directory,
    }
}

pub fn bot() -> Requester {
    Requester {
        id: UserId(1),
        username: "Bezzębna Stara Sobasa".to_string(),
        avatar: None,
    }
}

pub fn user(id: u64) -> Requester {
    Requester {
        id: UserId(id),
        username: format!("user{id}"),
        avatar: Some("hash".to_string()),
    }
}

pub fn voice_room(id: u64, humans: &[u64], bots: &[u64]) -> RoomSnapshot {
    let occupants = humans
        .iter()
        .map(|&id| Occupant {
            user_id: UserId(id),
            bot: false,
        })
        .chain(bots.iter().map(|&id| Occupant {
            user_id: UserId(id),
            bot: true,
        }))
        .collect();
    RoomSnapshot {
        id: ChannelId(id),
        kind: ChannelKind::Voice,
        occupants,
    }
}

pub fn community(id: u64, afk: Option<u64>, rooms: Vec<RoomSnapshot>) -> CommunitySnapshot {
    CommunitySnapshot {
        id: CommunityId(id),
        afk_room: afk.map(ChannelId),
        rooms,
    }
}

pub fn binding(community: u64, room: u64, text: u64) -> SessionBinding {
    SessionBinding {
        community: CommunityId(community),
        voice_room: ChannelId(room),
        text_channel: ChannelId(text),
    }
}

/// A command sent from text channel 500 by user 42.
pub fn message(community: u64, voice_room: Option<u64>, content: &str) -> InboundMessage {
    InboundMessage {
        community: CommunityId(community),
        channel: ChannelId(500),
        author: user(42),
        author_is_bot: false,
        author_voice_room: voice_room.map(ChannelId),
        content: content.to_string(),
    }
}
