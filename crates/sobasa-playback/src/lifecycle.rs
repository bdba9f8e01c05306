//! Session creation and teardown.
//!
//! Open and close for one community run under that community's lifecycle
//! lock, so a teardown always finishes before its successor is created and
//! two concurrent opens cannot both observe an empty slot.

use crate::backend::{PlayOptions, SessionBinding};
use crate::error::PlaybackError;
use crate::orchestrator::Orchestrator;
use crate::store::{PlaybackSession, SessionId};
use rand::Rng;
use sobasa_types::{CommunityId, Requester, Track};
use tokio::time::{sleep, timeout};

/// Which clip a new session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// A random clip from the ambient pool.
    Ambient,
    /// The fixed clip played on an explicit join.
    Anthem,
}

impl Orchestrator {
    /// Opens a session for `binding`, replacing any existing session in the
    /// community, and starts playing one clip from `source`.
    ///
    /// A session record stays in the store even when a later step fails;
    /// callers treat it as possibly unusable and close it explicitly.
    pub async fn open_session(
        &self,
        binding: SessionBinding,
        source: ContentSource,
        requester: &Requester,
    ) -> Result<PlaybackSession, PlaybackError> {
        let community = binding.community;
        let lock = self.lifecycle_lock(community);
        let _guard = lock.lock().await;

        let reason = format!("{} stopped the playback.", requester.username);
        if self.teardown(community, &reason).await {
            sleep(self.config.playback.teardown_settle()).await;
        }

        let session = PlaybackSession::new(binding);
        let id = session.id;
        self.sessions.insert(session);
        tracing::info!(
            %community,
            room = %binding.voice_room,
            text_channel = %binding.text_channel,
            session = %id,
            ?source,
            "created playback session"
        );

        self.backend.create_session(&binding).await?;

        let connected = self.sessions.get(community).is_some_and(|s| s.connected);
        if !connected {
            let limit = self.config.playback.connect_timeout();
            match timeout(limit, self.backend.connect(&binding)).await {
                Err(_) => return Err(PlaybackError::ConnectTimeout(limit)),
                Ok(result) => result?,
            }
            self.sessions.update(community, id, |s| s.connected = true);
            sleep(self.config.playback.connect_settle()).await;
        }

        let query = self.query_for(source);
        let track = self
            .backend
            .search(&query, requester)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PlaybackError::NoTracks(query.clone()))?;
        let track = self.prepare_track(track, source, requester);

        // The track becomes current before `play` is sent: the backend's
        // start event can overtake the play response, and the relay matches
        // it against `current` to recover the metadata overrides.
        let next = self
            .sessions
            .update(community, id, |s| {
                s.queued = Some(track);
                if s.playing {
                    return None;
                }
                s.current = s.queued.take();
                s.current.clone()
            })
            .ok_or(PlaybackError::SessionClosed)?;

        if let Some(track) = next {
            let options = PlayOptions::default();
            if let Err(e) = self.backend.play(community, &track, options).await {
                self.sessions.update(community, id, |s| {
                    if s.current.as_ref().is_some_and(|c| c.encoded == track.encoded) {
                        s.current = None;
                    }
                });
                return Err(e.into());
            }
            tracing::debug!(%community, title = %track.info.title, "started playback");
            self.sessions.update(community, id, |s| {
                s.playing = true;
                s.paused = options.paused;
                s.volume = options.volume;
            });
        }

        self.sessions
            .get(community)
            .filter(|s| s.id == id)
            .ok_or(PlaybackError::SessionClosed)
    }

    /// Tears down the community's session. Returns `false` when there was
    /// none.
    pub async fn close_session(&self, community: CommunityId, reason: &str) -> bool {
        let lock = self.lifecycle_lock(community);
        let _guard = lock.lock().await;
        self.teardown(community, reason).await
    }

    /// Tears down the session only if it is still `id`.
    pub(crate) async fn close_if_current(
        &self,
        community: CommunityId,
        id: SessionId,
        reason: &str,
    ) -> bool {
        let lock = self.lifecycle_lock(community);
        let _guard = lock.lock().await;
        if !self.sessions.get(community).is_some_and(|s| s.id == id) {
            return false;
        }
        self.teardown(community, reason).await
    }

    /// Tears down the session only if it is still `id` and nothing is
    /// playing. Used for idle cleanup after the queue ends.
    pub(crate) async fn close_if_idle(
        &self,
        community: CommunityId,
        id: SessionId,
        reason: &str,
    ) -> bool {
        let lock = self.lifecycle_lock(community);
        let _guard = lock.lock().await;
        let idle = self
            .sessions
            .get(community)
            .is_some_and(|s| s.id == id && !s.playing && s.queued.is_none());
        if !idle {
            return false;
        }
        self.teardown(community, reason).await
    }

    /// Requests backend teardown, then drops the record. Callers hold the
    /// community's lifecycle lock.
    async fn teardown(&self, community: CommunityId, reason: &str) -> bool {
        let Some(session) = self.sessions.get(community) else {
            return false;
        };

        if let Err(e) = self.backend.destroy(community, reason).await {
            tracing::warn!(
                %community,
                session = %session.id,
                error = %e,
                "backend teardown failed; dropping session anyway"
            );
        }
        self.sessions.remove_if(community, session.id);
        tracing::info!(%community, session = %session.id, reason, "destroyed playback session");
        true
    }

    fn query_for(&self, source: ContentSource) -> String {
        let content = &self.config.content;
        match source {
            ContentSource::Ambient => {
                let index = rand::thread_rng().gen_range(0..content.fragment_count.max(1));
                content
                    .fragments_dir
                    .join(format!("{index}.mp3"))
                    .to_string_lossy()
                    .into_owned()
            }
            ContentSource::Anthem => content.anthem_path.to_string_lossy().into_owned(),
        }
    }

    fn prepare_track(
        &self,
        mut track: Track,
        source: ContentSource,
        requester: &Requester,
    ) -> Track {
        track.requester = Some(requester.clone());
        if source == ContentSource::Anthem {
            let content = &self.config.content;
            track.info.title = content.anthem_title.clone();
            track.info.author = content.anthem_author.clone();
            track.info.artwork_url = content.anthem_artwork_url.clone();
        }
        track
    }
}
