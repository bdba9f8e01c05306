use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LYRICS: &str = "Sobas młody biznesmen
Uderzył swoją starą
Tak mocno, tak mocno
Poleciały jej zęby.
[x2]

Każdy ząb na podłodze
Bezzębna teraz ona
Bez słów, bez słów
Patrzy na niego.
[x2]

Życie, toczy się
Z zębami, czy bez
Miłość boli, mocno
W sercu i ustach.

Życie toczy się
Z zębami czy bez
Miłość boli mocno
W sercu i ustach.
[x4]";

fn default_prefix() -> String {
    "!".to_string()
}

fn default_teardown_settle_ms() -> u64 {
    200
}

fn default_connect_settle_ms() -> u64 {
    500
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_idle_destroy_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_min_delay_ms() -> u64 {
    1_800_000
}

fn default_max_delay_ms() -> u64 {
    3_600_000
}

fn default_fragments_dir() -> PathBuf {
    PathBuf::from("fragments")
}

fn default_fragment_count() -> u32 {
    10
}

fn default_anthem_path() -> PathBuf {
    PathBuf::from("bezzebna-stara-sobasa.mp3")
}

fn default_anthem_title() -> String {
    "Bezzębna Stara Sobasa".to_string()
}

fn default_anthem_author() -> String {
    "Various Artists".to_string()
}

fn default_anthem_artwork_url() -> Option<String> {
    Some("https://i1.sndcdn.com/artworks-HlUb7cSzbjCgenn3-hl5aSA-t500x500.jpg".to_string())
}

fn default_lyrics() -> String {
    DEFAULT_LYRICS.to_string()
}

/// Session lifecycle timing.
///
/// The settle delays bridge backend acknowledgements that arrive
/// asynchronously: teardown of a previous player, and the voice handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Wait after tearing down a previous session before creating the next.
    #[serde(default = "default_teardown_settle_ms")]
    pub teardown_settle_ms: u64,

    /// Wait after issuing a voice connect before first use.
    #[serde(default = "default_connect_settle_ms")]
    pub connect_settle_ms: u64,

    /// Upper bound on the connect request itself.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Delay before an idle session (queue ended) is destroyed.
    #[serde(default = "default_idle_destroy_ms")]
    pub idle_destroy_ms: u64,
}

impl PlaybackConfig {
    pub fn teardown_settle(&self) -> Duration {
        Duration::from_millis(self.teardown_settle_ms)
    }

    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_destroy(&self) -> Duration {
        Duration::from_millis(self.idle_destroy_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            teardown_settle_ms: default_teardown_settle_ms(),
            connect_settle_ms: default_connect_settle_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_destroy_ms: default_idle_destroy_ms(),
        }
    }
}

/// Ambient scheduler settings. The reschedule delay is drawn uniformly
/// from `[min_delay_ms, max_delay_ms)` on every tick.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// What the bot plays and says.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Directory holding the ambient clips `0.mp3` .. `{fragment_count - 1}.mp3`.
    #[serde(default = "default_fragments_dir")]
    pub fragments_dir: PathBuf,

    #[serde(default = "default_fragment_count")]
    pub fragment_count: u32,

    /// The clip played on an explicit join.
    #[serde(default = "default_anthem_path")]
    pub anthem_path: PathBuf,

    #[serde(default = "default_anthem_title")]
    pub anthem_title: String,

    #[serde(default = "default_anthem_author")]
    pub anthem_author: String,

    #[serde(default = "default_anthem_artwork_url")]
    pub anthem_artwork_url: Option<String>,

    #[serde(default = "default_lyrics")]
    pub lyrics: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            fragments_dir: default_fragments_dir(),
            fragment_count: default_fragment_count(),
            anthem_path: default_anthem_path(),
            anthem_title: default_anthem_title(),
            anthem_author: default_anthem_author(),
            anthem_artwork_url: default_anthem_artwork_url(),
            lyrics: default_lyrics(),
        }
    }
}

/// Everything the orchestrator needs to know at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Command prefix, matched case-insensitively.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub content: ContentConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            playback: PlaybackConfig::default(),
            scheduler: SchedulerConfig::default(),
            content: ContentConfig::default(),
        }
    }
}
