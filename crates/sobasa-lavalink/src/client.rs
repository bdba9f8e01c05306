//! REST side of a Lavalink node.

use crate::config::LavalinkConfig;
use crate::error::LavalinkError;
use crate::model::{ErrorResponse, LoadResult, UpdatePlayer};
use reqwest::header::AUTHORIZATION;
use reqwest::{Response, StatusCode};
use sobasa_types::CommunityId;
use std::sync::RwLock;

/// Client for one Lavalink node's REST API. The session id comes from the
/// event socket's `ready` message; player calls fail with
/// [`LavalinkError::NotReady`] until it arrives.
#[derive(Debug)]
pub struct LavalinkClient {
    config: LavalinkConfig,
    http: reqwest::Client,
    session_id: RwLock<Option<String>>,
}

impl LavalinkClient {
    pub fn new(config: LavalinkConfig) -> Result<Self, LavalinkError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.client_name.clone())
            .build()?;
        Ok(Self {
            config,
            http,
            session_id: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &LavalinkConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Records the session id announced by the node.
    pub fn set_session_id(&self, session_id: Option<String>) {
        *self.session_id.write().unwrap_or_else(|e| e.into_inner()) = session_id;
    }

    fn player_url(&self, guild: CommunityId) -> Result<String, LavalinkError> {
        let session = self.session_id().ok_or(LavalinkError::NotReady)?;
        Ok(format!(
            "{}/sessions/{session}/players/{guild}",
            self.config.rest_url()
        ))
    }

    /// Resolves `identifier` (a URL, a search query or a local path).
    pub async fn load_tracks(&self, identifier: &str) -> Result<LoadResult, LavalinkError> {
        let response = self
            .http
            .get(format!("{}/loadtracks", self.config.rest_url()))
            .header(AUTHORIZATION, &self.config.password)
            .query(&[("identifier", identifier)])
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// Creates or updates the player of `guild`.
    pub async fn update_player(
        &self,
        guild: CommunityId,
        update: &UpdatePlayer,
    ) -> Result<(), LavalinkError> {
        let response = self
            .http
            .patch(self.player_url(guild)?)
            .header(AUTHORIZATION, &self.config.password)
            .query(&[("noReplace", "false")])
            .json(update)
            .send()
            .await?;
        check(response).await?;
        tracing::trace!(%guild, ?update, "player updated");
        Ok(())
    }

    /// Destroys the player of `guild`. A missing player is not an error.
    pub async fn destroy_player(&self, guild: CommunityId) -> Result<(), LavalinkError> {
        let response = self
            .http
            .delete(self.player_url(guild)?)
            .header(AUTHORIZATION, &self.config.password)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(%guild, "player already gone");
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }
}

/// Maps non-success responses to [`LavalinkError::Status`], preferring the
/// message from Lavalink's error body.
async fn check(response: Response) -> Result<Response, LavalinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) if !error.message.is_empty() => error.message,
        Ok(error) => error.error,
        Err(_) => body,
    };
    Err(LavalinkError::Status {
        status: status.as_u16(),
        message,
    })
}
