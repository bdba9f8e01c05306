//! Track and requester metadata.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// Base URL for user avatars on the Discord CDN.
const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";

/// The user a track was played for, kept for attribution in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub username: String,
    /// Avatar hash, if the user has a custom avatar.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Requester {
    /// Returns the 80px webp avatar URL, or `None` when the user has no avatar.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{}/{}/{}.webp?size=80", AVATAR_CDN, self.id, hash))
    }
}

/// Descriptive metadata of a track as reported by the audio backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub is_seekable: bool,
    #[serde(default)]
    pub author: String,
    /// Duration in milliseconds.
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub isrc: Option<String>,
    #[serde(default)]
    pub source_name: String,
}

/// A playable track: the backend's opaque encoding plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque backend encoding used to start playback.
    pub encoded: String,
    pub info: TrackInfo,
    #[serde(default)]
    pub requester: Option<Requester>,
}

impl Track {
    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.info.length
    }
}
