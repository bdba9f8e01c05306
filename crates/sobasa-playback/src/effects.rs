//! Validation and application of playback-mutating commands.
//!
//! Arguments are validated first. Then the precondition chain runs, in
//! order: the author is in a voice room, the community has a session bound
//! to that room, and (for commands that touch playback) a track is loaded.
//! Nothing is mutated until every check passes, and a failed backend call
//! leaves the recorded state untouched.

use crate::command::{
    parse_int, parse_time_spec, Command, InboundMessage, TimeField, TimeSpecError, ToggleEffect,
};
use crate::error::BackendError;
use crate::orchestrator::Orchestrator;
use crate::store::PlaybackSession;
use sobasa_types::filters::{eq_preset, eq_preset_names};
use sobasa_types::{ChannelId, FilterChainState};
use thiserror::Error;

/// Accepted range for the playback volume.
pub const VOLUME_RANGE: std::ops::RangeInclusive<i64> = 1..=1000;

/// Accepted range for the filter-stage volume.
pub const EFFECT_VOLUME_RANGE: std::ops::RangeInclusive<i64> = 0..=5;

/// Sentinel accepted by the named-effect command to clear the equalizer.
pub const CLEAR_EFFECT: &str = "clear";

/// A user input problem. Replied to the author, never logged as a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("You must be in a voice channel.")]
    NotInVoice,

    #[error("Bot is not connected.")]
    NotConnected,

    #[error("You must be in the same voice channel as the bot.")]
    WrongRoom,

    #[error("No song playing.")]
    NothingPlaying,

    #[error("invalid argument for {0:?}")]
    Usage(Command),

    #[error("invalid {} in time spec", .0.label())]
    InvalidTimeField(TimeField),

    #[error("The position can't be bigger than the song's duration.")]
    SeekOutOfRange,

    #[error("unknown effect")]
    UnknownEffect,
}

impl Rejection {
    /// The reply shown to the author.
    pub fn reply(&self, prefix: &str) -> String {
        let seek_hint = format!("Try `{prefix}{} <Hours:Minutes:Seconds>`", Command::Seek.word());
        match self {
            Self::Usage(Command::Seek) => format!("Invalid command. {seek_hint}"),
            Self::Usage(command) => match command.argument() {
                Some(argument) => format!(
                    "Invalid command. Try `{prefix}{} <{argument}>`",
                    command.word()
                ),
                None => format!("Invalid command. Try `{prefix}{}`", command.word()),
            },
            Self::InvalidTimeField(field) => {
                format!("Invalid {} number. {seek_hint}", field.label())
            }
            Self::UnknownEffect => {
                let mut reply = format!(
                    "Invalid command. Try `{prefix}{} <efekt>`. Effects:\n{CLEAR_EFFECT}",
                    Command::Effect.word()
                );
                for name in eq_preset_names() {
                    reply.push('\n');
                    reply.push_str(name);
                }
                reply
            }
            other => other.to_string(),
        }
    }
}

/// Why a command did not take effect.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Whether a command needs a loaded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrackRequirement {
    Required,
    NotRequired,
}

/// A validated filter change.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    EffectVolume(i64),
    BassBoost(i64),
    /// `None` clears the equalizer.
    Preset(Option<&'static str>),
    Reset,
    Speed(i64),
    Pitch(i64),
    Rate(i64),
    Toggle(ToggleEffect),
}

impl FilterChange {
    /// Applies the change to a copy of the chain.
    pub fn apply(&self, filters: &mut FilterChainState) {
        match self {
            Self::EffectVolume(volume) => filters.volume = *volume as f32,
            Self::BassBoost(level) => filters.set_bass_boost(*level),
            Self::Preset(None) => filters.equalizer.clear(),
            Self::Preset(Some(name)) => {
                if let Some((_, bands)) = eq_preset(name) {
                    filters.equalizer = bands;
                }
            }
            Self::Reset => *filters = FilterChainState::default(),
            Self::Speed(speed) => filters.set_speed(*speed as f64),
            Self::Pitch(pitch) => filters.set_pitch(*pitch as f64),
            Self::Rate(rate) => filters.set_rate(*rate as f64),
            Self::Toggle(ToggleEffect::Rotation) => filters.rotation = !filters.rotation,
            Self::Toggle(ToggleEffect::Vibrato) => filters.vibrato = !filters.vibrato,
            Self::Toggle(ToggleEffect::Tremolo) => filters.tremolo = !filters.tremolo,
            Self::Toggle(ToggleEffect::LowPass) => filters.low_pass = !filters.low_pass,
            Self::Toggle(ToggleEffect::Nightcore) => filters.toggle_nightcore(),
            Self::Toggle(ToggleEffect::Vaporwave) => filters.toggle_vaporwave(),
            Self::Toggle(ToggleEffect::Karaoke) => filters.karaoke = !filters.karaoke,
        }
    }

    /// Confirmation shown after the change is applied.
    pub fn confirmation(&self) -> String {
        match self {
            Self::EffectVolume(_) => "Changed the effect volume.".to_string(),
            Self::BassBoost(0) => "Disabled bass boost for the current playback.".to_string(),
            Self::BassBoost(_) => "Bass boosted the current playback.".to_string(),
            Self::Preset(None) => "Disabled effects for the current playback.".to_string(),
            Self::Preset(Some(_)) => "Applied effect for the current playback.".to_string(),
            Self::Reset => "Removed all effects.".to_string(),
            Self::Speed(_) => "Changed the speed.".to_string(),
            Self::Pitch(_) => "Changed the pitch.".to_string(),
            Self::Rate(_) => "Changed the rate.".to_string(),
            Self::Toggle(effect) => format!("Applied {} effect.", effect.label()),
        }
    }
}

/// Parses a required integer argument for `command`.
pub fn integer_arg(command: Command, arg: Option<&str>) -> Result<i64, Rejection> {
    arg.and_then(parse_int).ok_or(Rejection::Usage(command))
}

/// Validates the volume argument.
pub fn validate_volume(arg: Option<&str>) -> Result<u16, Rejection> {
    let volume = integer_arg(Command::Volume, arg)?;
    if !VOLUME_RANGE.contains(&volume) {
        return Err(Rejection::Usage(Command::Volume));
    }
    Ok(volume as u16)
}

/// Validates the effect-volume argument.
pub fn validate_effect_volume(arg: Option<&str>) -> Result<FilterChange, Rejection> {
    let volume = integer_arg(Command::EffectVolume, arg)?;
    if !EFFECT_VOLUME_RANGE.contains(&volume) {
        return Err(Rejection::Usage(Command::EffectVolume));
    }
    Ok(FilterChange::EffectVolume(volume))
}

/// Validates the named-effect argument against the preset catalogue.
pub fn validate_preset(arg: Option<&str>) -> Result<FilterChange, Rejection> {
    let arg = arg.ok_or(Rejection::UnknownEffect)?;
    if arg == CLEAR_EFFECT {
        return Ok(FilterChange::Preset(None));
    }
    eq_preset(arg)
        .map(|(name, _)| FilterChange::Preset(Some(name)))
        .ok_or(Rejection::UnknownEffect)
}

/// Validates the time spec of a seek. The duration check happens once the
/// current track is known.
pub fn validate_seek(arg: Option<&str>) -> Result<i64, Rejection> {
    let arg = arg.ok_or(Rejection::Usage(Command::Seek))?;
    parse_time_spec(arg).map_err(|e| match e {
        TimeSpecError::TooManyFields => Rejection::Usage(Command::Seek),
        TimeSpecError::InvalidField(field) => Rejection::InvalidTimeField(field),
    })
}

/// Checks a seek target against the current track's duration.
pub fn check_seek_target(position_ms: i64, duration_ms: u64) -> Result<u64, Rejection> {
    if position_ms < 0 || position_ms as u64 > duration_ms {
        return Err(Rejection::SeekOutOfRange);
    }
    Ok(position_ms as u64)
}

impl Orchestrator {
    /// The precondition chain shared by every session command.
    pub(crate) fn require_session(
        &self,
        message: &InboundMessage,
        track: TrackRequirement,
    ) -> Result<(ChannelId, PlaybackSession), Rejection> {
        let room = message.author_voice_room.ok_or(Rejection::NotInVoice)?;
        let session = self
            .sessions
            .get(message.community)
            .ok_or(Rejection::NotConnected)?;
        if session.voice_room != room {
            return Err(Rejection::WrongRoom);
        }
        if track == TrackRequirement::Required && session.current.is_none() {
            return Err(Rejection::NothingPlaying);
        }
        Ok((room, session))
    }

    /// Applies a validated filter change to the author's session.
    ///
    /// The whole chain is sent on every change, so concurrent changes in one
    /// community run one at a time, each starting from its predecessor's
    /// recorded state.
    pub async fn apply_filter_change(
        &self,
        message: &InboundMessage,
        change: &FilterChange,
    ) -> Result<(), CommandError> {
        let lock = self.filter_lock(message.community);
        let _guard = lock.lock().await;
        let (_, session) = self.require_session(message, TrackRequirement::Required)?;

        let mut filters = session.filters.clone();
        change.apply(&mut filters);
        self.backend
            .apply_filters(session.community, &filters)
            .await?;

        if self
            .sessions
            .update(session.community, session.id, |s| s.filters = filters)
            .is_none()
        {
            tracing::debug!(
                community = %session.community,
                session = %session.id,
                "session replaced while applying filters"
            );
        }
        Ok(())
    }

    /// Sets the playback volume of the author's session.
    pub async fn apply_volume(
        &self,
        message: &InboundMessage,
        volume: u16,
    ) -> Result<(), CommandError> {
        let (_, session) = self.require_session(message, TrackRequirement::Required)?;
        self.backend.set_volume(session.community, volume).await?;
        self.sessions
            .update(session.community, session.id, |s| s.volume = volume);
        Ok(())
    }

    /// Seeks the author's session to `position_ms`.
    pub async fn apply_seek(
        &self,
        message: &InboundMessage,
        position_ms: i64,
    ) -> Result<(), CommandError> {
        let (_, session) = self.require_session(message, TrackRequirement::Required)?;
        let duration = session
            .current
            .as_ref()
            .map(|track| track.duration_ms())
            .unwrap_or_default();
        let target = check_seek_target(position_ms, duration)?;
        self.backend.seek(session.community, target).await?;
        Ok(())
    }
}
