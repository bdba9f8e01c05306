//! Rendering of the shared filter chain into Lavalink's `filters` object.

use serde::Serialize;
use sobasa_types::{EqBand, FilterChainState, Karaoke, LowPass, Rotation, Timescale, Wave};

/// The `filters` field of a player update. Lavalink replaces the whole
/// chain on every update, so omitted filters are switched off.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub volume: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub equalizer: Vec<EqBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karaoke: Option<Karaoke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<Timescale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<Wave>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Wave>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_pass: Option<LowPass>,
}

impl From<&FilterChainState> for Filters {
    fn from(state: &FilterChainState) -> Self {
        Self {
            volume: state.volume,
            equalizer: state.equalizer.clone(),
            karaoke: state.karaoke_filter(),
            timescale: state.has_timescale().then_some(state.timescale),
            tremolo: state.tremolo_filter(),
            vibrato: state.vibrato_filter(),
            rotation: state.rotation_filter(),
            low_pass: state.low_pass_filter(),
        }
    }
}
