use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::sources::SourceKind;

/// Main configuration for moodlift
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch; when false every event is suppressed
    pub enabled: bool,
    pub sources: SourcesConfig,
    pub events: EventsConfig,
    pub display: DisplayConfig,
    pub enhancer: EnhancerConfig,
    /// Time-of-day preferences keyed by period name ("morning", "afternoon", "evening")
    pub time_preferences: HashMap<String, TimePreference>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            sources: SourcesConfig::default(),
            events: EventsConfig::default(),
            display: DisplayConfig::default(),
            enhancer: EnhancerConfig::default(),
            time_preferences: HashMap::new(),
        }
    }
}

/// Message source selection and per-source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Weight table for the weighted random draw; weight 0 excludes a source
    pub weights: HashMap<SourceKind, u32>,
    pub external: ExternalConfig,
    pub scripture: ScriptureConfig,
    pub stoic: StoicConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let mut weights = HashMap::new();
        weights.insert(SourceKind::Default, 40);
        weights.insert(SourceKind::External, 25);
        weights.insert(SourceKind::Scripture, 20);
        weights.insert(SourceKind::Stoic, 15);
        Self {
            weights,
            external: ExternalConfig::default(),
            scripture: ScriptureConfig::default(),
            stoic: StoicConfig::default(),
        }
    }
}

impl SourcesConfig {
    /// Configured weight for a source (missing entry = 0 = excluded).
    pub fn weight(&self, kind: SourceKind) -> u32 {
        self.weights.get(&kind).copied().unwrap_or(0)
    }

    /// Per-source enablement. The default source can never be disabled:
    /// it backs the static fallback tables.
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Default => true,
            SourceKind::External => self.external.enabled,
            SourceKind::Scripture => self.scripture.enabled,
            SourceKind::Stoic => self.stoic.enabled,
        }
    }
}

/// Settings for the external joke/quote APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub enabled: bool,
    /// Request timeout in seconds (fast fail preferred for volatile APIs)
    pub timeout_secs: u64,
    pub cache_ttl_minutes: u64,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
            cache_ttl_minutes: 60,
        }
    }
}

/// Settings for the daily-text (scripture) source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptureConfig {
    pub enabled: bool,
    /// The daily-text endpoint needs a longer timeout for reliability
    pub timeout_secs: u64,
    /// Daily text changes once per day
    pub cache_ttl_minutes: u64,
    /// Show scripture content at most once per this many minutes
    pub rate_limit_minutes: i64,
}

impl Default for ScriptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 20,
            cache_ttl_minutes: 24 * 60,
            rate_limit_minutes: 30,
        }
    }
}

/// Settings for the stoic-wisdom source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoicConfig {
    pub enabled: bool,
    /// Chance of generating fresh wisdom via the enhancer instead of
    /// quoting the table (0.0 = table only)
    pub pure_generation_ratio: f64,
}

impl Default for StoicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pure_generation_ratio: 0.4,
        }
    }
}

/// Per-event enablement and gate probability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub enabled: bool,
    /// Chance in [0, 1] that any message is shown for this event
    pub probability: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EventsConfig {
    pub session_start: EventConfig,
    pub stop: EventConfig,
    pub notification: EventConfig,
}

/// Output formatting applied after a message is produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Cap for non-enhanced messages, in characters
    pub max_length: usize,
    pub include_emojis: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_length: 120,
            include_emojis: true,
        }
    }
}

/// Settings for the optional local text-generation enhancer (ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    pub enabled: bool,
    pub model: String,
    /// Strict timeout for the subprocess call, in seconds
    pub timeout_secs: u64,
    /// Models to prefer when discovering what is installed locally
    pub preferred_models: Vec<String>,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "llama3.2:latest".into(),
            timeout_secs: 5,
            preferred_models: vec![
                "llama3.2:latest".into(),
                "phi3.5:3.8b".into(),
                "mistral:7b-instruct".into(),
                "llama3.2:1b".into(),
                "gemma2:2b".into(),
                "qwen2.5:0.5b".into(),
            ],
        }
    }
}

/// A time-of-day window that boosts the selection weight of some sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimePreference {
    /// Half-open hour range [start, end)
    pub hours: Vec<u32>,
    pub prefer_sources: Vec<SourceKind>,
    /// Additive weight boost for preferred sources
    pub boost: u32,
}

impl Default for TimePreference {
    fn default() -> Self {
        Self {
            hours: Vec::new(),
            prefer_sources: Vec::new(),
            boost: 20,
        }
    }
}

/// Coarse time of day used for prompt selection and source preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
}

impl TimePeriod {
    pub fn name(self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
        }
    }

    /// Built-in hour mapping: morning 5-11, afternoon 12-16, evening otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimePeriod::Morning,
            12..=16 => TimePeriod::Afternoon,
            _ => TimePeriod::Evening,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the user's config, degrading to defaults when missing or malformed.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load(&path).unwrap_or_else(|e| {
                tracing::debug!("using default config: {e:#}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Base directory for config, state, and cache.
    /// `MOODLIFT_CONFIG_DIR` overrides the platform default.
    pub fn base_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("MOODLIFT_CONFIG_DIR") {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        let project_dirs = directories::ProjectDirs::from("dev", "moodlift", "moodlift")
            .context("Failed to determine user directories")?;
        Ok(project_dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Rate limiter state file
    pub fn state_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("last_shown.json"))
    }

    /// On-disk response cache directory
    pub fn cache_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("cache"))
    }

    pub fn event(&self, event: crate::sources::HookEvent) -> &EventConfig {
        use crate::sources::HookEvent;
        match event {
            HookEvent::SessionStart => &self.events.session_start,
            HookEvent::Stop => &self.events.stop,
            HookEvent::Notification => &self.events.notification,
        }
    }

    /// Resolve the time period for an hour, honoring configured hour windows
    /// before the built-in mapping. Periods are checked in a fixed order so
    /// overlapping windows resolve the same way on every run.
    pub fn period_at(&self, hour: u32) -> TimePeriod {
        for period in [TimePeriod::Morning, TimePeriod::Afternoon, TimePeriod::Evening] {
            if let Some(pref) = self.time_preferences.get(period.name()) {
                if pref.hours.len() >= 2 && pref.hours[0] <= hour && hour < pref.hours[1] {
                    return period;
                }
            }
        }
        TimePeriod::from_hour(hour)
    }

    /// Preferred sources and their additive boost for a period.
    pub fn preferred_for(&self, period: TimePeriod) -> (Vec<SourceKind>, u32) {
        match self.time_preferences.get(period.name()) {
            Some(pref) => (pref.prefer_sources.clone(), pref.boost),
            None => (Vec::new(), 0),
        }
    }
}
