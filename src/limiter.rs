use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const KEY_PREFIX: &str = "last_shown_";

/// Tracks when each content type was last shown, persisted as a flat JSON
/// object `{"last_shown_<content_type>": "<RFC-3339 timestamp>"}`.
///
/// The file is advisory: unreadable state loads as empty ("never shown"),
/// failed writes are swallowed, and concurrent hook invocations may lose an
/// update (last writer wins).
pub struct RateLimiter {
    state_path: PathBuf,
    state: HashMap<String, DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new(state_path: PathBuf) -> Self {
        let state = Self::load(&state_path);
        Self { state_path, state }
    }

    fn load(path: &Path) -> HashMap<String, DateTime<Utc>> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return HashMap::new();
        };
        let Ok(raw) = serde_json::from_str::<HashMap<String, serde_json::Value>>(&content) else {
            tracing::debug!("rate limiter state unparsable, starting fresh");
            return HashMap::new();
        };
        raw.into_iter()
            .filter_map(|(key, value)| {
                // Skip entries with unparsable timestamps rather than failing
                let ts = value.as_str()?.parse::<DateTime<Utc>>().ok()?;
                Some((key, ts))
            })
            .collect()
    }

    /// Persist the whole state. Failure is swallowed: rate limiting is not
    /// worth breaking a hook over.
    fn save(&self) {
        let raw: HashMap<&String, String> = self
            .state
            .iter()
            .map(|(k, v)| (k, v.to_rfc3339()))
            .collect();
        if let Some(parent) = self.state_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&raw) {
            if let Err(e) = std::fs::write(&self.state_path, json) {
                tracing::debug!("failed to persist rate limiter state: {e}");
            }
        }
    }

    fn key(content_type: &str) -> String {
        format!("{KEY_PREFIX}{content_type}")
    }

    /// True when the content type has never been shown, or its cooldown has
    /// elapsed.
    pub fn should_show(&self, content_type: &str, cooldown: Duration) -> bool {
        self.should_show_at(content_type, cooldown, Utc::now())
    }

    pub(crate) fn should_show_at(
        &self,
        content_type: &str,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        match self.state.get(&Self::key(content_type)) {
            Some(last_shown) => now - *last_shown >= cooldown,
            None => true,
        }
    }

    /// Record that the content type was just shown and persist.
    pub fn mark_shown(&mut self, content_type: &str) {
        self.mark_shown_at(content_type, Utc::now());
    }

    pub(crate) fn mark_shown_at(&mut self, content_type: &str, now: DateTime<Utc>) {
        self.state.insert(Self::key(content_type), now);
        self.save();
    }

    /// Remaining wait before the content type may be shown again; `None`
    /// when it is available now.
    pub fn get_time_until_available(
        &self,
        content_type: &str,
        cooldown: Duration,
    ) -> Option<Duration> {
        self.time_until_available_at(content_type, cooldown, Utc::now())
    }

    pub(crate) fn time_until_available_at(
        &self,
        content_type: &str,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let last_shown = self.state.get(&Self::key(content_type))?;
        let elapsed = now - *last_shown;
        if elapsed >= cooldown {
            None
        } else {
            Some(cooldown - elapsed)
        }
    }

    /// Clear one recorded timestamp, or all of them.
    pub fn reset(&mut self, content_type: Option<&str>) {
        match content_type {
            Some(ct) => {
                self.state.remove(&Self::key(ct));
            }
            None => self.state.clear(),
        }
        self.save();
    }

    /// Recorded (content_type, last_shown) pairs, for status display.
    pub fn entries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.state
            .iter()
            .map(|(k, v)| (k.trim_start_matches(KEY_PREFIX).to_string(), *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (tempfile::TempDir, RateLimiter) {
        let dir = tempfile::tempdir().unwrap();
        let limiter = RateLimiter::new(dir.path().join("last_shown.json"));
        (dir, limiter)
    }

    #[test]
    fn test_never_shown_is_allowed() {
        let (_dir, limiter) = limiter();
        assert!(limiter.should_show("daily_text", Duration::minutes(30)));
    }

    #[test]
    fn test_cooldown_blocks_then_releases() {
        let (_dir, mut limiter) = limiter();
        let cooldown = Duration::minutes(30);
        let t0 = Utc::now();

        limiter.mark_shown_at("daily_text", t0);
        assert!(!limiter.should_show_at("daily_text", cooldown, t0));
        assert!(!limiter.should_show_at("daily_text", cooldown, t0 + Duration::minutes(29)));
        assert!(limiter.should_show_at("daily_text", cooldown, t0 + Duration::minutes(30)));
    }

    #[test]
    fn test_time_until_available() {
        let (_dir, mut limiter) = limiter();
        let cooldown = Duration::minutes(30);
        let t0 = Utc::now();

        assert!(limiter
            .time_until_available_at("daily_text", cooldown, t0)
            .is_none());
        limiter.mark_shown_at("daily_text", t0);
        let remaining = limiter
            .time_until_available_at("daily_text", cooldown, t0 + Duration::minutes(5))
            .unwrap();
        assert_eq!(remaining, Duration::minutes(25));
        assert!(limiter
            .time_until_available_at("daily_text", cooldown, t0 + Duration::minutes(31))
            .is_none());
    }

    #[test]
    fn test_state_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_shown.json");
        let t0 = Utc::now();
        {
            let mut limiter = RateLimiter::new(path.clone());
            limiter.mark_shown_at("daily_text", t0);
        }
        let reloaded = RateLimiter::new(path);
        assert!(!reloaded.should_show_at("daily_text", Duration::minutes(30), t0));
    }

    #[test]
    fn test_reset_single_and_all() {
        let (_dir, mut limiter) = limiter();
        limiter.mark_shown("daily_text");
        limiter.mark_shown("joke");

        limiter.reset(Some("daily_text"));
        assert!(limiter.should_show("daily_text", Duration::minutes(30)));
        assert!(!limiter.should_show("joke", Duration::minutes(30)));

        limiter.reset(None);
        assert!(limiter.should_show("joke", Duration::minutes(30)));
    }

    #[test]
    fn test_unparsable_timestamps_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_shown.json");
        std::fs::write(
            &path,
            r#"{"last_shown_daily_text": "not a date", "last_shown_joke": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let limiter = RateLimiter::new(path);
        // Corrupt entry behaves as never shown
        assert!(limiter.should_show("daily_text", Duration::minutes(30)));
        // Old-but-valid entry is honored
        assert!(limiter.should_show("joke", Duration::minutes(30)));
        assert_eq!(limiter.entries().len(), 1);
    }

    #[test]
    fn test_corrupt_state_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_shown.json");
        std::fs::write(&path, "{{{{").unwrap();
        let limiter = RateLimiter::new(path);
        assert!(limiter.should_show("anything", Duration::minutes(1)));
    }
}
