//! The audio filter chain applied to a playback session.
//!
//! `FilterChainState` is the bot's own record of what has been applied. Each
//! field is changed independently; the audio backend receives the whole
//! chain, rendered into its wire format, after every change.

use serde::{Deserialize, Serialize};

/// Number of equalizer bands the backend exposes (25 Hz .. 16 kHz).
pub const EQ_BAND_COUNT: u8 = 15;

/// Per-band multipliers applied to the bass-boost level.
pub const BASS_BOOST_COEFFICIENTS: [f32; 5] = [0.5, 0.4, 0.3, 0.2, 0.1];

/// Timescale used by the nightcore toggle.
pub const NIGHTCORE: Timescale = Timescale {
    speed: 1.289_999_5,
    pitch: 1.289_999_5,
    rate: 0.936_599_95,
};

/// Timescale used by the vaporwave toggle.
pub const VAPORWAVE: Timescale = Timescale {
    speed: 0.85,
    pitch: 0.8,
    rate: 1.0,
};

/// Rotation applied by the rotation toggle.
pub const ROTATION: Rotation = Rotation { rotation_hz: 0.2 };

/// Vibrato applied by the vibrato toggle.
pub const VIBRATO: Wave = Wave {
    frequency: 10.0,
    depth: 1.0,
};

/// Tremolo applied by the tremolo toggle.
pub const TREMOLO: Wave = Wave {
    frequency: 4.0,
    depth: 0.8,
};

/// Low-pass applied by the lowpass toggle.
pub const LOW_PASS: LowPass = LowPass { smoothing: 20.0 };

/// Karaoke applied by the karaoke toggle.
pub const KARAOKE: Karaoke = Karaoke {
    level: 1.0,
    mono_level: 1.0,
    filter_band: 220.0,
    filter_width: 100.0,
};

/// One equalizer band gain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    pub band: u8,
    pub gain: f32,
}

/// Playback speed, pitch and rate multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timescale {
    pub speed: f64,
    pub pitch: f64,
    pub rate: f64,
}

impl Default for Timescale {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch: 1.0,
            rate: 1.0,
        }
    }
}

/// Audio panning around the listener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotation {
    pub rotation_hz: f64,
}

/// Frequency/depth oscillation, shared by vibrato and tremolo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub frequency: f32,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowPass {
    pub smoothing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Karaoke {
    pub level: f32,
    pub mono_level: f32,
    pub filter_band: f32,
    pub filter_width: f32,
}

/// The bot's record of a session's filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChainState {
    /// Filter-stage volume multiplier (1.0 = unchanged).
    pub volume: f32,
    pub equalizer: Vec<EqBand>,
    pub timescale: Timescale,
    pub rotation: bool,
    pub vibrato: bool,
    pub tremolo: bool,
    pub low_pass: bool,
    pub nightcore: bool,
    pub vaporwave: bool,
    pub karaoke: bool,
}

impl Default for FilterChainState {
    fn default() -> Self {
        Self {
            volume: 1.0,
            equalizer: Vec::new(),
            timescale: Timescale::default(),
            rotation: false,
            vibrato: false,
            tremolo: false,
            low_pass: false,
            nightcore: false,
            vaporwave: false,
            karaoke: false,
        }
    }
}

impl FilterChainState {
    /// Sets the speed multiplier. Any timescale preset stops being active.
    pub fn set_speed(&mut self, speed: f64) {
        self.timescale.speed = speed;
        self.nightcore = false;
        self.vaporwave = false;
    }

    /// Sets the pitch multiplier. Any timescale preset stops being active.
    pub fn set_pitch(&mut self, pitch: f64) {
        self.timescale.pitch = pitch;
        self.nightcore = false;
        self.vaporwave = false;
    }

    /// Sets the rate multiplier. Any timescale preset stops being active.
    pub fn set_rate(&mut self, rate: f64) {
        self.timescale.rate = rate;
        self.nightcore = false;
        self.vaporwave = false;
    }

    /// Toggles the nightcore timescale; turning it on turns vaporwave off.
    pub fn toggle_nightcore(&mut self) {
        if self.nightcore {
            self.timescale = Timescale::default();
            self.nightcore = false;
        } else {
            self.timescale = NIGHTCORE;
            self.nightcore = true;
            self.vaporwave = false;
        }
    }

    /// Toggles the vaporwave timescale; turning it on turns nightcore off.
    pub fn toggle_vaporwave(&mut self) {
        if self.vaporwave {
            self.timescale = Timescale::default();
            self.vaporwave = false;
        } else {
            self.timescale = VAPORWAVE;
            self.vaporwave = true;
            self.nightcore = false;
        }
    }

    /// Replaces the equalizer with the bass-boost curve for `level`, or
    /// clears it when `level` is zero.
    pub fn set_bass_boost(&mut self, level: i64) {
        if level == 0 {
            self.equalizer.clear();
            return;
        }
        self.equalizer = BASS_BOOST_COEFFICIENTS
            .iter()
            .enumerate()
            .map(|(band, coefficient)| EqBand {
                band: band as u8,
                gain: level as f32 * coefficient,
            })
            .collect();
    }

    pub fn rotation_filter(&self) -> Option<Rotation> {
        self.rotation.then_some(ROTATION)
    }

    pub fn vibrato_filter(&self) -> Option<Wave> {
        self.vibrato.then_some(VIBRATO)
    }

    pub fn tremolo_filter(&self) -> Option<Wave> {
        self.tremolo.then_some(TREMOLO)
    }

    pub fn low_pass_filter(&self) -> Option<LowPass> {
        self.low_pass.then_some(LOW_PASS)
    }

    pub fn karaoke_filter(&self) -> Option<Karaoke> {
        self.karaoke.then_some(KARAOKE)
    }

    /// Whether the timescale differs from the identity.
    pub fn has_timescale(&self) -> bool {
        self.timescale != Timescale::default()
    }
}

/// Named equalizer presets, in display order.
pub const EQ_PRESETS: &[(&str, &[f32])] = &[
    (
        "BassboostEarrape",
        &[
            0.6567, 0.67, 0.67, 0.0, -0.25, 0.15, -0.2, 0.23, 0.35, 0.45, 0.55, 0.6, 0.55, 0.0,
        ],
    ),
    (
        "BassboostHigh",
        &[
            0.1875, 0.375, -0.25, -0.1875, 0.0, -0.0125, -0.025, -0.0175, 0.0, 0.0, 0.0125, 0.025,
            0.375, 0.125, 0.125,
        ],
    ),
    (
        "BassboostMedium",
        &[
            0.1125, 0.225, -0.225, -0.1125, 0.0, -0.0075, -0.015, -0.0105, 0.0, 0.0, 0.0075, 0.015,
            0.225, 0.075, 0.075,
        ],
    ),
    (
        "BassboostLow",
        &[
            0.0625, 0.125, -0.125, -0.0625, 0.0, -0.0042, -0.0083, -0.0058, 0.0, 0.0, 0.0042,
            0.0083, 0.125, 0.0417, 0.0417,
        ],
    ),
    (
        "BetterMusic",
        &[
            0.025, 0.03, 0.0325, 0.0225, 0.0175, 0.0125, 0.0, -0.0125, -0.0125, 0.0, 0.0125,
            0.025, 0.03, 0.0325, 0.0225,
        ],
    ),
    (
        "Rock",
        &[
            0.3, 0.25, 0.2, 0.1, 0.05, -0.05, -0.15, -0.2, -0.1, -0.05, 0.05, 0.1, 0.2, 0.25, 0.3,
        ],
    ),
    (
        "Classic",
        &[
            0.375, 0.35, 0.125, 0.0, 0.0, 0.125, 0.55, 0.05, 0.125, 0.25, 0.2, 0.25, 0.3, 0.25,
            0.3,
        ],
    ),
    (
        "Pop",
        &[
            -0.25, 0.48, 0.59, 0.72, 0.56, 0.15, -0.24, -0.24, -0.16, -0.16, 0.0, 0.0, 0.0, 0.0,
            0.0,
        ],
    ),
    (
        "Electronic",
        &[
            0.375, 0.35, 0.125, 0.0, 0.0, -0.125, -0.125, 0.0, 0.25, 0.125, 0.15, 0.2, 0.25, 0.35,
            0.4,
        ],
    ),
    (
        "FullSound",
        &[
            0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25,
            0.25,
        ],
    ),
    (
        "Gaming",
        &[
            0.35, 0.3, 0.25, 0.2, 0.15, 0.1, 0.05, 0.0, -0.05, -0.1, -0.15, -0.2, -0.2, -0.2,
            -0.2,
        ],
    ),
];

/// Looks up a preset by name, ignoring ASCII case. Returns the canonical
/// name and its band list.
pub fn eq_preset(name: &str) -> Option<(&'static str, Vec<EqBand>)> {
    EQ_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(preset, gains)| {
            let bands = gains
                .iter()
                .enumerate()
                .map(|(band, gain)| EqBand {
                    band: band as u8,
                    gain: *gain,
                })
                .collect();
            (*preset, bands)
        })
}

/// Names of all presets, in display order.
pub fn eq_preset_names() -> impl Iterator<Item = &'static str> {
    EQ_PRESETS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bass_boost_scales_five_bands() {
        let mut filters = FilterChainState::default();
        filters.set_bass_boost(2);
        let gains: Vec<f32> = filters.equalizer.iter().map(|b| b.gain).collect();
        assert_eq!(gains, vec![1.0, 0.8, 0.6, 0.4, 0.2]);
        assert_eq!(filters.equalizer[4].band, 4);

        filters.set_bass_boost(0);
        assert!(filters.equalizer.is_empty());
    }

    #[test]
    fn nightcore_and_vaporwave_are_exclusive() {
        let mut filters = FilterChainState::default();
        filters.toggle_nightcore();
        assert!(filters.nightcore);
        assert_eq!(filters.timescale, NIGHTCORE);

        filters.toggle_vaporwave();
        assert!(filters.vaporwave);
        assert!(!filters.nightcore);
        assert_eq!(filters.timescale, VAPORWAVE);

        filters.toggle_vaporwave();
        assert!(!filters.vaporwave);
        assert!(!filters.has_timescale());
    }

    #[test]
    fn manual_speed_drops_preset_flag() {
        let mut filters = FilterChainState::default();
        filters.toggle_nightcore();
        filters.set_speed(2.0);
        assert!(!filters.nightcore);
        assert_eq!(filters.timescale.speed, 2.0);
        assert_eq!(filters.timescale.pitch, NIGHTCORE.pitch);
    }

    #[test]
    fn preset_lookup_ignores_case() {
        let (name, bands) = eq_preset("rOcK").unwrap();
        assert_eq!(name, "Rock");
        assert_eq!(bands.len(), EQ_BAND_COUNT as usize);
        assert!(eq_preset("polka").is_none());
    }

    #[test]
    fn presets_fit_the_band_range() {
        for (name, gains) in EQ_PRESETS {
            assert!(gains.len() <= EQ_BAND_COUNT as usize, "{name} has too many bands");
            assert!(gains.iter().all(|g| (-0.25..=1.0).contains(g)), "{name} gain out of range");
        }
    }
}
