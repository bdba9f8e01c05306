//! Gateway and REST payloads, limited to the fields the bot reads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sobasa_types::{ChannelId, ChannelKind, CommunityId, Embed, OutboundMessage, Requester, UserId};

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_IDENTIFY: u8 = 2;
pub const OP_PRESENCE_UPDATE: u8 = 3;
pub const OP_VOICE_STATE_UPDATE: u8 = 4;
pub const OP_RESUME: u8 = 6;
pub const OP_RECONNECT: u8 = 7;
pub const OP_INVALID_SESSION: u8 = 9;
pub const OP_HELLO: u8 = 10;
pub const OP_HEARTBEAT_ACK: u8 = 11;

const GUILDS: u64 = 1 << 0;
const GUILD_VOICE_STATES: u64 = 1 << 7;
const GUILD_MESSAGES: u64 = 1 << 9;
const MESSAGE_CONTENT: u64 = 1 << 15;

/// Gateway intents the bot subscribes to.
pub const INTENTS: u64 = GUILDS | GUILD_VOICE_STATES | GUILD_MESSAGES | MESSAGE_CONTENT;

/// Activity type shown as "Watching ...".
const ACTIVITY_WATCHING: u8 = 3;

/// One gateway frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    pub fn new(op: u8, d: Value) -> Self {
        Self { op, d, s: None, t: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Requester {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub user: User,
    pub session_id: String,
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub guild_id: Option<CommunityId>,
}

impl Channel {
    pub fn channel_kind(&self) -> ChannelKind {
        match self.kind {
            0 | 5 | 15 => ChannelKind::Text,
            2 => ChannelKind::Voice,
            13 => ChannelKind::Stage,
            _ => ChannelKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceState {
    #[serde(default)]
    pub guild_id: Option<CommunityId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub member: Option<Member>,
}

impl VoiceState {
    /// Whether the state belongs to a bot account, when the payload says so.
    pub fn is_bot(&self) -> Option<bool> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .map(|user| user.bot)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: CommunityId,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub voice_states: Vec<VoiceState>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnavailableGuild {
    pub id: CommunityId,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceServerUpdate {
    pub guild_id: CommunityId,
    pub token: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<CommunityId>,
    pub author: User,
    #[serde(default)]
    pub content: String,
}

pub fn identify(token: &str, status_text: &str) -> GatewayPayload {
    GatewayPayload::new(
        OP_IDENTIFY,
        json!({
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "sobasa",
                "device": "sobasa"
            },
            "presence": presence_body(status_text)
        }),
    )
}

pub fn resume(token: &str, session_id: &str, seq: Option<u64>) -> GatewayPayload {
    GatewayPayload::new(
        OP_RESUME,
        json!({ "token": token, "session_id": session_id, "seq": seq }),
    )
}

pub fn heartbeat(seq: Option<u64>) -> GatewayPayload {
    GatewayPayload::new(OP_HEARTBEAT, json!(seq))
}

fn presence_body(status_text: &str) -> Value {
    json!({
        "since": null,
        "activities": [{ "name": status_text, "type": ACTIVITY_WATCHING }],
        "status": "online",
        "afk": false
    })
}

pub fn presence(status_text: &str) -> GatewayPayload {
    GatewayPayload::new(OP_PRESENCE_UPDATE, presence_body(status_text))
}

/// Joins `channel`, or leaves voice when it is `None`.
pub fn voice_state_update(
    guild: CommunityId,
    channel: Option<ChannelId>,
    self_deaf: bool,
) -> GatewayPayload {
    GatewayPayload::new(
        OP_VOICE_STATE_UPDATE,
        json!({
            "guild_id": guild,
            "channel_id": channel,
            "self_mute": false,
            "self_deaf": self_deaf
        }),
    )
}

fn embed_body(embed: &Embed) -> Value {
    let mut body = json!({
        "title": embed.title,
        "description": embed.description,
    });
    if let Some(author) = &embed.author {
        body["author"] = json!({ "name": author.name, "icon_url": author.icon_url });
    }
    if let Some(url) = &embed.thumbnail_url {
        body["thumbnail"] = json!({ "url": url });
    }
    body
}

/// Body of `POST /channels/{id}/messages`. Mentions are never pinged.
pub fn message_body(message: &OutboundMessage) -> Value {
    let mut body = match message {
        OutboundMessage::Text { content } => json!({ "content": content }),
        OutboundMessage::Embed { embed } => json!({ "embeds": [embed_body(embed)] }),
    };
    body["allowed_mentions"] = json!({ "parse": [] });
    body
}
