use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gateway closed the connection: {code} {reason}")]
    Closed { code: u16, reason: String },

    #[error("Gateway is not running")]
    GatewayGone,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
