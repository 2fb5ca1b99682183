//! Message source providers and the registry that dispatches to them.
//!
//! Every provider is best-effort: `Ok(None)` and `Err(_)` both mean "nothing
//! usable from this source right now", and the selector moves on. Only the
//! built-in default source is infallible.

mod default;
mod jokes;
mod scripture;
mod stoic;

pub use default::DefaultSource;
pub use jokes::ExternalSource;
pub use scripture::ScriptureSource;
pub use stoic::StoicSource;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiClient, CacheStore, FetchError, RetryPolicy};
use crate::config::{Config, TimePeriod};
use crate::enhance::TextEnhancer;

/// The assistant lifecycle events this tool hooks into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    SessionStart,
    Stop,
    Notification,
}

impl HookEvent {
    /// The `hook_event_name` value the assistant sends on stdin.
    pub fn hook_name(self) -> &'static str {
        match self {
            HookEvent::SessionStart => "SessionStart",
            HookEvent::Stop => "Stop",
            HookEvent::Notification => "Notification",
        }
    }

    pub fn from_hook_name(name: &str) -> Option<Self> {
        match name {
            "SessionStart" => Some(HookEvent::SessionStart),
            "Stop" => Some(HookEvent::Stop),
            "Notification" => Some(HookEvent::Notification),
            _ => None,
        }
    }
}

/// Which provider family a message comes from. Doubles as the key type for
/// the config weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in messages and local generation; always available
    Default,
    /// Public joke and quote APIs
    External,
    /// Daily scripture text
    Scripture,
    /// Stoic quotes and generated wisdom
    Stoic,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Default,
        SourceKind::External,
        SourceKind::Scripture,
        SourceKind::Stoic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Default => "default",
            SourceKind::External => "external",
            SourceKind::Scripture => "scripture",
            SourceKind::Stoic => "stoic",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(SourceKind::Default),
            "external" => Ok(SourceKind::External),
            "scripture" => Ok(SourceKind::Scripture),
            "stoic" => Ok(SourceKind::Stoic),
            other => Err(format!(
                "unknown source '{other}' (expected default, external, scripture, or stoic)"
            )),
        }
    }
}

/// Finer-grained flavor of a produced message, for logging and preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Joke,
    Quote,
    Scripture,
    Stoic,
    Default,
}

impl MessageKind {
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Joke => "joke",
            MessageKind::Quote => "quote",
            MessageKind::Scripture => "scripture",
            MessageKind::Stoic => "stoic",
            MessageKind::Default => "default",
        }
    }
}

/// A message a provider produced, before display formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub content: String,
    pub kind: MessageKind,
    pub author: Option<String>,
    /// True when the content came out of the local enhancer; enhanced text
    /// is exempt from the display length cap.
    pub enhanced: bool,
}

impl Candidate {
    pub fn new(content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            content: content.into(),
            kind,
            author: None,
            enhanced: false,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn enhanced(mut self) -> Self {
        self.enhanced = true;
        self
    }
}

/// Why a provider produced nothing. The selector treats every variant the
/// same way; the split exists for logging.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Registry of all providers, built once per invocation from config.
pub struct Sources {
    external: ExternalSource,
    scripture: ScriptureSource,
    stoic: StoicSource,
    default: DefaultSource,
}

impl Sources {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        // No cache dir just means no persistence; fetches still work
        let cache = |sub: &str| match Config::cache_dir() {
            Ok(dir) => CacheStore::persistent(dir.join(sub)),
            Err(_) => CacheStore::in_memory(),
        };

        let external_client = ApiClient::new(
            None,
            std::time::Duration::from_secs(config.sources.external.timeout_secs),
            RetryPolicy::default(),
            cache("external"),
            chrono::Duration::minutes(config.sources.external.cache_ttl_minutes as i64),
        )?;
        let scripture_client = ApiClient::new(
            None,
            std::time::Duration::from_secs(config.sources.scripture.timeout_secs),
            RetryPolicy::default(),
            cache("scripture"),
            chrono::Duration::minutes(config.sources.scripture.cache_ttl_minutes as i64),
        )?;

        Ok(Self {
            external: ExternalSource::new(external_client),
            scripture: ScriptureSource::new(scripture_client),
            stoic: StoicSource::new(config.sources.stoic.pure_generation_ratio),
            default: DefaultSource::new(),
        })
    }

    /// Registry with in-memory caches and a rebased external client, for
    /// tests that stand up a local mock server.
    #[cfg(test)]
    pub fn for_tests(base_url: String, timeout: std::time::Duration) -> Self {
        let retry = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let client = |base: Option<String>| {
            ApiClient::new(
                base,
                timeout,
                retry.clone(),
                CacheStore::in_memory(),
                chrono::Duration::minutes(5),
            )
            .unwrap()
        };
        Self {
            external: ExternalSource::with_base(client(Some(base_url.clone()))),
            scripture: ScriptureSource::with_base(client(None), base_url),
            stoic: StoicSource::new(0.0),
            default: DefaultSource::new(),
        }
    }

    /// Ask one provider for a message.
    pub async fn produce<E: TextEnhancer>(
        &self,
        kind: SourceKind,
        event: HookEvent,
        period: TimePeriod,
        enhancer: &E,
        rng: &mut (impl Rng + Send),
    ) -> Result<Option<Candidate>, SourceError> {
        match kind {
            SourceKind::Default => {
                Ok(Some(self.default.produce(event, period, enhancer, rng).await))
            }
            SourceKind::External => self.external.produce(event, enhancer, rng).await,
            SourceKind::Scripture => self.scripture.produce(period, enhancer, rng).await,
            SourceKind::Stoic => self.stoic.produce(enhancer, rng).await,
        }
    }

    /// Static fallback that never touches the network or the enhancer.
    pub fn fallback(&self, event: HookEvent, rng: &mut impl Rng) -> Candidate {
        self.default.static_message(event, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_event_names_roundtrip() {
        for event in [HookEvent::SessionStart, HookEvent::Stop, HookEvent::Notification] {
            assert_eq!(HookEvent::from_hook_name(event.hook_name()), Some(event));
        }
        assert_eq!(HookEvent::from_hook_name("PreToolUse"), None);
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("scripture".parse::<SourceKind>(), Ok(SourceKind::Scripture));
        assert!("unknown".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_source_kind_serde_lowercase() {
        let json = serde_json::to_string(&SourceKind::External).unwrap();
        assert_eq!(json, "\"external\"");
        let parsed: SourceKind = serde_json::from_str("\"stoic\"").unwrap();
        assert_eq!(parsed, SourceKind::Stoic);
    }

    #[test]
    fn test_candidate_builder() {
        let c = Candidate::new("hello", MessageKind::Quote)
            .with_author("Seneca")
            .enhanced();
        assert_eq!(c.author.as_deref(), Some("Seneca"));
        assert!(c.enhanced);
    }
}
