//! Translation of gateway dispatches into cache updates and events.

use crate::cache::GuildCache;
use crate::model::{
    Channel, Guild, MessageCreate, Ready, UnavailableGuild, VoiceServerUpdate, VoiceState,
};
use serde_json::Value;
use sobasa_playback::{GatewayEvent, InboundMessage};
use sobasa_types::{ChannelId, CommunityId, Requester};

/// What the gateway reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscordEvent {
    Ready { user: Requester },
    /// The bot's own voice connection changed.
    VoiceSession {
        community: CommunityId,
        channel: Option<ChannelId>,
        session_id: String,
    },
    /// Voice server credentials for the bot's connection.
    VoiceServer {
        community: CommunityId,
        token: String,
        endpoint: String,
    },
    Gateway(GatewayEvent),
}

/// Applies dispatch `kind` to the cache and returns the resulting events.
pub fn translate(
    cache: &GuildCache,
    kind: &str,
    data: Value,
) -> Result<Vec<DiscordEvent>, serde_json::Error> {
    let events = match kind {
        "READY" => {
            let ready: Ready = serde_json::from_value(data)?;
            let user = Requester::from(&ready.user);
            cache.set_current_user(ready.user);
            vec![DiscordEvent::Ready { user }]
        }
        "GUILD_CREATE" => {
            let guild: Guild = serde_json::from_value(data)?;
            if !guild.unavailable {
                cache.upsert_guild(&guild);
            }
            Vec::new()
        }
        "GUILD_DELETE" => {
            let guild: UnavailableGuild = serde_json::from_value(data)?;
            if guild.unavailable {
                tracing::warn!(community = %guild.id, "guild unavailable");
                Vec::new()
            } else {
                cache.remove_guild(guild.id);
                vec![DiscordEvent::Gateway(GatewayEvent::CommunityDeleted {
                    community: guild.id,
                })]
            }
        }
        "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
            let channel: Channel = serde_json::from_value(data)?;
            cache.upsert_channel(&channel);
            Vec::new()
        }
        "CHANNEL_DELETE" => {
            let channel: Channel = serde_json::from_value(data)?;
            match channel.guild_id {
                Some(community) => {
                    cache.remove_channel(community, channel.id);
                    vec![DiscordEvent::Gateway(GatewayEvent::RoomDeleted {
                        community,
                        room: channel.id,
                    })]
                }
                None => Vec::new(),
            }
        }
        "VOICE_STATE_UPDATE" => {
            let voice: VoiceState = serde_json::from_value(data)?;
            let mut events: Vec<DiscordEvent> = cache
                .apply_voice_state(&voice)
                .into_iter()
                .map(|change| {
                    DiscordEvent::Gateway(GatewayEvent::OccupancyChanged {
                        community: change.community,
                        room: change.room,
                        humans: change.humans,
                    })
                })
                .collect();
            if let Some(community) = voice.guild_id {
                if cache.current_user_id() == Some(voice.user_id) {
                    events.splice(
                        0..0,
                        [
                            DiscordEvent::VoiceSession {
                                community,
                                channel: voice.channel_id,
                                session_id: voice.session_id,
                            },
                            DiscordEvent::Gateway(GatewayEvent::BotVoiceChanged {
                                community,
                                room: voice.channel_id,
                            }),
                        ],
                    );
                }
            }
            events
        }
        "VOICE_SERVER_UPDATE" => {
            let update: VoiceServerUpdate = serde_json::from_value(data)?;
            match update.endpoint {
                Some(endpoint) => vec![DiscordEvent::VoiceServer {
                    community: update.guild_id,
                    token: update.token,
                    endpoint,
                }],
                None => {
                    tracing::debug!(community = %update.guild_id, "voice server deallocated");
                    Vec::new()
                }
            }
        }
        "MESSAGE_CREATE" => {
            let message: MessageCreate = serde_json::from_value(data)?;
            let Some(community) = message.guild_id else {
                return Ok(Vec::new());
            };
            let author_voice_room = cache.voice_room(community, message.author.id);
            vec![DiscordEvent::Gateway(GatewayEvent::Message(InboundMessage {
                community,
                channel: message.channel_id,
                author: Requester::from(&message.author),
                author_is_bot: message.author.bot,
                author_voice_room,
                content: message.content,
            }))]
        }
        _ => Vec::new(),
    };
    Ok(events)
}
