//! Voice playback orchestration for the Sobasa bot.
//!
//! Owns the one-session-per-community invariant, arbitrates session
//! creation and teardown, drives the ambient scheduler that joins occupied
//! rooms at random intervals, and validates and applies playback-effect
//! commands against session state.
//!
//! The audio backend, the chat gateway and the gateway's community cache
//! are reached through the traits in [`backend`]; this crate performs no
//! I/O of its own.

pub mod backend;
pub mod command;
pub mod config;
mod dispatch;
pub mod effects;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod relay;
pub mod scheduler;
pub mod store;
pub mod suppression;

pub use backend::{AudioBackend, ChatGateway, Directory, PlayOptions, SessionBinding};
pub use command::{InboundMessage, ToggleEffect};
pub use config::{ContentConfig, OrchestratorConfig, PlaybackConfig, SchedulerConfig};
pub use effects::{CommandError, FilterChange, Rejection};
pub use error::{BackendError, DeliveryError, PlaybackError};
pub use lifecycle::ContentSource;
pub use orchestrator::Orchestrator;
pub use relay::{BackendEvent, GatewayEvent, TrackEndReason};
pub use store::{PlaybackSession, SessionId};
