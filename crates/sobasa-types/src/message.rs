//! Outbound chat messages.

use serde::{Deserialize, Serialize};

/// The author line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A rich notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A message the bot sends to a text channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { content: String },
    Embed { embed: Embed },
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }
}

impl From<Embed> for OutboundMessage {
    fn from(embed: Embed) -> Self {
        Self::Embed { embed }
    }
}

/// Escapes markdown emphasis characters (`*` and `_`) in free text.
pub fn escape_emphasis(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '*' || c == '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
