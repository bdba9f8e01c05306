use thiserror::Error;

#[derive(Error, Debug)]
pub enum LavalinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lavalink returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Track loading failed: {0}")]
    LoadFailed(String),

    #[error("No Lavalink session yet")]
    NotReady,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
