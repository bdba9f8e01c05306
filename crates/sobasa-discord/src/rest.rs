//! Outbound messages over the Discord REST API.

use crate::config::DiscordConfig;
use crate::error::DiscordError;
use crate::model::message_body;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use sobasa_playback::{ChatGateway, DeliveryError};
use sobasa_types::{ChannelId, OutboundMessage};

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl RestClient {
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Posts `message` to `channel`.
    pub async fn create_message(
        &self,
        channel: ChannelId,
        message: &OutboundMessage,
    ) -> Result<(), DiscordError> {
        let response = self
            .http
            .post(format!("{}/channels/{channel}/messages", self.api_url))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .json(&message_body(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(DiscordError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatGateway for RestClient {
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        self.create_message(channel, &message)
            .await
            .map_err(|e| match e {
                DiscordError::Status { status, message } => {
                    DeliveryError::Rejected { status, message }
                }
                other => DeliveryError::Send(other.to_string()),
            })
    }
}
