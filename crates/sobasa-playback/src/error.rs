use std::time::Duration;
use thiserror::Error;

/// Failure reported by the audio backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("audio backend is not ready")]
    NotReady,

    #[error("audio backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("audio backend request failed: {0}")]
    Request(String),

    #[error("voice gateway error: {0}")]
    Voice(String),
}

/// Failure while opening a playback session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("voice connect did not complete within {0:?}")]
    ConnectTimeout(Duration),

    #[error("backend rejected session: {0}")]
    BackendRejected(#[from] BackendError),

    #[error("no playable track for {0}")]
    NoTracks(String),

    #[error("session was closed while opening")]
    SessionClosed,
}

/// Failure while delivering an outbound chat message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("message delivery failed: {0}")]
    Send(String),

    #[error("message rejected by chat platform ({status}): {message}")]
    Rejected { status: u16, message: String },
}
