//! Client for a Lavalink v4 audio node: REST calls for players and track
//! loading, plus the event WebSocket decoded into [`NodeEvent`]s.

pub mod client;
pub mod config;
pub mod error;
pub mod filters;
pub mod model;
pub mod node;

pub use client::LavalinkClient;
pub use config::LavalinkConfig;
pub use error::LavalinkError;
pub use filters::Filters;
pub use model::{EndReason, Event, Exception, LavalinkTrack, LoadResult, UpdatePlayer, VoiceState};
pub use node::{run_node, NodeEvent};
