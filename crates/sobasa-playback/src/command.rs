//! Text command parsing.
//!
//! A command is a message that starts with the prefix (any case), followed
//! immediately by a command word; remaining whitespace-separated words are
//! arguments.

use sobasa_types::{ChannelId, CommunityId, Requester};

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub community: CommunityId,
    pub channel: ChannelId,
    pub author: Requester,
    pub author_is_bot: bool,
    /// The voice room the author is connected to, if any.
    pub author_voice_room: Option<ChannelId>,
    pub content: String,
}

/// Effects with an on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    Rotation,
    Vibrato,
    Tremolo,
    LowPass,
    Nightcore,
    Vaporwave,
    Karaoke,
}

impl ToggleEffect {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::Vibrato => "vibrato",
            Self::Tremolo => "tremolo",
            Self::LowPass => "lowpass",
            Self::Nightcore => "nightcore",
            Self::Vaporwave => "vaporwave",
            Self::Karaoke => "karaoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Lyrics,
    Join,
    Suppress,
    Seek,
    Volume,
    EffectVolume,
    BassBoost,
    Effect,
    Reset,
    Speed,
    Pitch,
    Rate,
    Toggle(ToggleEffect),
    Leave,
}

/// Command words and a short description, in help order.
pub const COMMANDS: &[(Command, &[&str], Option<&str>, &str)] = &[
    (Command::Help, &["co_umiesz?", "pokaz"], None, "Shows this message"),
    (Command::Lyrics, &["tekst"], None, "Shows the lyrics"),
    (
        Command::Join,
        &["chodz", "dawaj", "zapierdalaj", "zakurwiaj"],
        None,
        "Joins your channel",
    ),
    (
        Command::Suppress,
        &["do_spania", "spac"],
        None,
        "Temporarily disables auto joining for your channel",
    ),
    (
        Command::Seek,
        &["tepnij", "tepaj"],
        Some("czas"),
        "Seeks the playback to the time provided",
    ),
    (
        Command::Volume,
        &["daj_glos"],
        Some("procent"),
        "Changes volume of the playback (1-1000, 100 = default)",
    ),
    (
        Command::EffectVolume,
        &["daj_glos_efektu"],
        Some("procent"),
        "Changes volume of the effect (0-5, 1 = default)",
    ),
    (
        Command::BassBoost,
        &["jebnij_basem"],
        Some("mnoznik"),
        "Bass boosts the playback",
    ),
    (
        Command::Effect,
        &["jebnij_efektem"],
        Some("efekt"),
        "Applies effect to the playback",
    ),
    (
        Command::Reset,
        &["jebnij_reset"],
        None,
        "Removes all playback effects",
    ),
    (
        Command::Speed,
        &["jebnij_kreche"],
        Some("predkosc"),
        "Sets speed of the playback (1 = default)",
    ),
    (
        Command::Pitch,
        &["jebnij_helu"],
        Some("wysokosc"),
        "Sets pitch of the playback (1 = default)",
    ),
    (
        Command::Rate,
        &["jebnij_ratio"],
        Some("wspolczynnik"),
        "Sets rate of the playback (1 = default)",
    ),
    (
        Command::Toggle(ToggleEffect::Rotation),
        &["jebnij_rotation"],
        None,
        "Applies rotation effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::Vibrato),
        &["jebnij_vibrato"],
        None,
        "Applies vibrato effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::Tremolo),
        &["jebnij_tremolo"],
        None,
        "Applies tremolo effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::LowPass),
        &["jebnij_lowpass"],
        None,
        "Applies lowpass effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::Nightcore),
        &["jebnij_nightcore"],
        None,
        "Applies nightcore effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::Vaporwave),
        &["jebnij_vaporwave"],
        None,
        "Applies vaporwave effect to the playback",
    ),
    (
        Command::Toggle(ToggleEffect::Karaoke),
        &["jebnij_karaoke"],
        None,
        "Applies karaoke effect to the playback",
    ),
    (
        Command::Leave,
        &["wyjdz", "wypierdalaj", "wykurwiaj"],
        None,
        "Leaves your channel",
    ),
];

impl Command {
    /// Resolves a lower-cased command word.
    pub fn from_word(word: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(_, words, _, _)| words.contains(&word))
            .map(|(command, _, _, _)| *command)
    }

    /// The first command word, used in usage hints.
    pub fn word(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(command, _, _, _)| *command == self)
            .and_then(|(_, words, _, _)| words.first().copied())
            .unwrap_or("")
    }

    /// Argument placeholder, for commands that take one.
    pub fn argument(self) -> Option<&'static str> {
        COMMANDS
            .iter()
            .find(|(command, _, _, _)| *command == self)
            .and_then(|(_, _, argument, _)| *argument)
    }
}

/// A parsed command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub args: Vec<String>,
}

impl Invocation {
    /// The first argument, if given.
    pub fn arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// Parses `content` as a command. Returns `None` for ordinary chatter and
/// unknown command words.
pub fn parse(prefix: &str, content: &str) -> Option<Invocation> {
    if content.len() <= prefix.len() {
        return None;
    }
    let head = content.get(..prefix.len())?;
    if head.to_lowercase() != prefix.to_lowercase() {
        return None;
    }

    let mut words = content.split_whitespace();
    let word = words.next()?.get(prefix.len()..)?.to_lowercase();
    let command = Command::from_word(&word)?;
    Some(Invocation {
        command,
        args: words.map(str::to_string).collect(),
    })
}

/// Parses a leading integer: optional sign, then one or more decimal digits.
/// Trailing characters after the digits are ignored.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// The field of a time spec that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Hours,
    Minutes,
    Seconds,
}

impl TimeField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }
}

/// Why a time spec was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpecError {
    TooManyFields,
    InvalidField(TimeField),
}

/// Parses `[[hours:]minutes:]seconds` into milliseconds. The result may be
/// negative; range checks belong to the caller.
pub fn parse_time_spec(spec: &str) -> Result<i64, TimeSpecError> {
    let fields: Vec<&str> = spec.split(':').collect();
    if fields.len() > 3 {
        return Err(TimeSpecError::TooManyFields);
    }

    let field = |index: usize, kind: TimeField, unit: i64| {
        parse_int(fields[index])
            .and_then(|value| value.checked_mul(unit))
            .ok_or(TimeSpecError::InvalidField(kind))
    };

    let n = fields.len();
    let mut position = field(n - 1, TimeField::Seconds, 1_000)?;
    if n >= 2 {
        position = position
            .checked_add(field(n - 2, TimeField::Minutes, 60_000)?)
            .ok_or(TimeSpecError::InvalidField(TimeField::Minutes))?;
    }
    if n == 3 {
        position = position
            .checked_add(field(0, TimeField::Hours, 3_600_000)?)
            .ok_or(TimeSpecError::InvalidField(TimeField::Hours))?;
    }
    Ok(position)
}

/// Renders the help listing for `prefix`.
pub fn help_text(prefix: &str) -> String {
    COMMANDS
        .iter()
        .map(|(_, words, argument, description)| {
            let words = words
                .iter()
                .map(|word| format!("{prefix}{word}"))
                .collect::<Vec<_>>()
                .join("|");
            match argument {
                Some(argument) => format!("`{words} <{argument}>` {description}"),
                None => format!("`{words}` {description}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
