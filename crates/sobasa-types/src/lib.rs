//! Shared types for the Sobasa voice bot.
//!
//! This crate provides the foundational types used across all Sobasa crates:
//! chat-platform identifiers, point-in-time snapshots of communities and
//! their voice rooms, track metadata, the audio filter chain, and the
//! outbound message model.
//!
//! No crate in the workspace depends on anything *except* `sobasa-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod filters;
pub mod message;
pub mod track;

pub use filters::{EqBand, FilterChainState, Karaoke, LowPass, Rotation, Timescale, Wave};
pub use message::{Embed, EmbedAuthor, OutboundMessage};
pub use track::{Requester, Track, TrackInfo};

/// Error returned when a snowflake identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid snowflake: {0}")]
pub struct InvalidSnowflake(pub String);

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidSnowflake;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>()
                    .map(Self)
                    .map_err(|_| InvalidSnowflake(s.to_string()))
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        // Discord encodes snowflakes as JSON strings; accept bare numbers too.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(u64),
                }

                match Raw::deserialize(deserializer)? {
                    Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
                    Raw::Number(n) => Ok(Self(n)),
                }
            }
        }
    };
}

snowflake_id!(
    /// A community (Discord guild).
    CommunityId
);
snowflake_id!(
    /// A channel within a community. Voice rooms and text channels share
    /// this identifier space, which is what allows a session's text target
    /// to be rebound onto its voice room.
    ChannelId
);
snowflake_id!(
    /// A chat-platform user (human or bot).
    UserId
);

/// The kind of a channel, as far as the bot cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Text-only channel.
    Text,
    /// Voice channel the bot can join and play into.
    Voice,
    /// Stage channel (voice-capable).
    Stage,
    /// Anything else (categories, forums, threads).
    Other,
}

impl ChannelKind {
    /// Whether audio can be played into a channel of this kind.
    pub fn is_voice_capable(self) -> bool {
        matches!(self, Self::Voice | Self::Stage)
    }
}

/// A user currently connected to a voice room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub user_id: UserId,
    pub bot: bool,
}

/// Point-in-time view of one channel within a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: ChannelId,
    pub kind: ChannelKind,
    #[serde(default)]
    pub occupants: Vec<Occupant>,
}

impl RoomSnapshot {
    /// Number of occupants that are not bots.
    pub fn human_count(&self) -> usize {
        self.occupants.iter().filter(|o| !o.bot).count()
    }
}

/// Point-in-time view of a community's rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    pub id: CommunityId,
    /// The AFK sink, which is never eligible for autonomous joins.
    pub afk_room: Option<ChannelId>,
    pub rooms: Vec<RoomSnapshot>,
}

impl CommunitySnapshot {
    /// Looks up a room by id.
    pub fn room(&self, id: ChannelId) -> Option<&RoomSnapshot> {
        self.rooms.iter().find(|r| r.id == id)
    }
}
