//! Routing of chat commands to the lifecycle manager and effect applier.

use crate::backend::SessionBinding;
use crate::command::{help_text, parse, Command, InboundMessage, Invocation};
use crate::effects::{
    integer_arg, validate_effect_volume, validate_preset, validate_seek, validate_volume,
    CommandError, FilterChange, Rejection, TrackRequirement,
};
use crate::lifecycle::ContentSource;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

impl Orchestrator {
    /// Handles one chat message. Messages from bots and messages that are
    /// not commands are ignored.
    pub async fn handle_message(self: &Arc<Self>, message: InboundMessage) {
        if message.author_is_bot {
            return;
        }
        let Some(invocation) = parse(&self.config.prefix, &message.content) else {
            return;
        };
        tracing::debug!(
            community = %message.community,
            author = %message.author.id,
            command = ?invocation.command,
            "received command"
        );

        match self.execute(&message, &invocation).await {
            Ok(Some(reply)) => self.reply(message.channel, reply).await,
            Ok(None) => {}
            Err(CommandError::Rejected(rejection)) => {
                self.reply(message.channel, rejection.reply(&self.config.prefix))
                    .await;
            }
            Err(CommandError::Backend(e)) => {
                tracing::error!(
                    community = %message.community,
                    command = ?invocation.command,
                    error = %e,
                    "backend call failed"
                );
                self.reply(message.channel, format!("Something went wrong: {e}"))
                    .await;
            }
        }
    }

    /// Runs a parsed command; `Ok(Some(_))` is the confirmation to reply with.
    async fn execute(
        &self,
        message: &InboundMessage,
        invocation: &Invocation,
    ) -> Result<Option<String>, CommandError> {
        let arg = invocation.arg();
        let change = match invocation.command {
            Command::Help => return Ok(Some(help_text(&self.config.prefix))),
            Command::Lyrics => return Ok(Some(self.config.content.lyrics.clone())),
            Command::Join => return self.join(message).await.map(|_| None),
            Command::Suppress => {
                let room = message.author_voice_room.ok_or(Rejection::NotInVoice)?;
                let reply = if self.toggle_suppression(message.community, room) {
                    "Temporarily disabled auto joining for your channel."
                } else {
                    "Re-enabled auto joining for your channel."
                };
                return Ok(Some(reply.to_string()));
            }
            Command::Leave => {
                let (_, session) = self.require_session(message, TrackRequirement::NotRequired)?;
                let reason = format!("{} stopped the playback.", message.author.username);
                self.close_session(session.community, &reason).await;
                return Ok(Some("Stopped the playback.".to_string()));
            }
            Command::Seek => {
                let position = validate_seek(arg)?;
                self.apply_seek(message, position).await?;
                return Ok(Some("Seeked the current song.".to_string()));
            }
            Command::Volume => {
                let volume = validate_volume(arg)?;
                self.apply_volume(message, volume).await?;
                return Ok(Some("Changed the volume.".to_string()));
            }
            Command::EffectVolume => validate_effect_volume(arg)?,
            Command::BassBoost => FilterChange::BassBoost(integer_arg(Command::BassBoost, arg)?),
            Command::Effect => validate_preset(arg)?,
            Command::Reset => FilterChange::Reset,
            Command::Speed => FilterChange::Speed(integer_arg(Command::Speed, arg)?),
            Command::Pitch => FilterChange::Pitch(integer_arg(Command::Pitch, arg)?),
            Command::Rate => FilterChange::Rate(integer_arg(Command::Rate, arg)?),
            Command::Toggle(effect) => FilterChange::Toggle(effect),
        };

        self.apply_filter_change(message, &change).await?;
        Ok(Some(change.confirmation()))
    }

    /// Joins the author's room and plays the anthem. Failures are reported
    /// to the author rather than bubbling up as backend errors.
    async fn join(&self, message: &InboundMessage) -> Result<(), CommandError> {
        let room = message.author_voice_room.ok_or(Rejection::NotInVoice)?;
        let binding = SessionBinding {
            community: message.community,
            voice_room: room,
            text_channel: message.channel,
        };
        if let Err(e) = self
            .open_session(binding, ContentSource::Anthem, &message.author)
            .await
        {
            tracing::error!(community = %message.community, %room, error = %e, "join failed");
            self.reply(message.channel, format!("Could not join your channel: {e}"))
                .await;
        }
        Ok(())
    }
}
