//! Weighted source selection and display formatting. This is the decision
//! core behind every hook handler: gate, pick a source, produce, format.

use chrono::Timelike;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::enhance::TextEnhancer;
use crate::limiter::RateLimiter;
use crate::sources::{Candidate, HookEvent, SourceKind, Sources};

/// Rate limiter key for scripture content.
const SCRIPTURE_CONTENT_TYPE: &str = "daily_text";

pub struct MessageSelector {
    config: Config,
    sources: Sources,
    limiter: RateLimiter,
}

impl MessageSelector {
    pub fn new(config: Config, sources: Sources, limiter: RateLimiter) -> Self {
        Self {
            config,
            sources,
            limiter,
        }
    }

    /// Run the full pipeline for an event. `None` means stay silent: the
    /// tool is disabled, the event is disabled, or the probability gate
    /// did not pass.
    pub async fn select<E: TextEnhancer>(
        &mut self,
        event: HookEvent,
        enhancer: &E,
    ) -> Option<String> {
        let hour = chrono::Local::now().hour();
        let mut rng = StdRng::from_entropy();
        self.select_inner(event, enhancer, hour, &mut rng).await
    }

    pub(crate) async fn select_inner<E: TextEnhancer>(
        &mut self,
        event: HookEvent,
        enhancer: &E,
        hour: u32,
        rng: &mut StdRng,
    ) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let event_cfg = self.config.event(event);
        if !event_cfg.enabled {
            return None;
        }
        if rng.gen::<f64>() >= event_cfg.probability {
            tracing::debug!(event = event.hook_name(), "probability gate closed");
            return None;
        }

        let period = self.config.period_at(hour);
        let mut pool = self.build_pool(period);

        // One cross-source retry, then the infallible fallback
        for _ in 0..2 {
            let Some(kind) = weighted_pick(&pool, rng) else {
                break;
            };
            match self
                .sources
                .produce(kind, event, period, enhancer, rng)
                .await
            {
                Ok(Some(candidate)) => {
                    if kind == SourceKind::Scripture {
                        self.limiter.mark_shown(SCRIPTURE_CONTENT_TYPE);
                    }
                    tracing::debug!(
                        source = kind.name(),
                        kind = candidate.kind.name(),
                        enhanced = candidate.enhanced,
                        "message selected"
                    );
                    return Some(self.format(candidate));
                }
                Ok(None) => {
                    tracing::debug!(source = kind.name(), "source produced nothing");
                }
                Err(e) => {
                    tracing::debug!(source = kind.name(), error = %e, "source failed");
                }
            }
            pool.retain(|(k, _)| *k != kind);
        }

        let fallback = self.sources.fallback(event, rng);
        Some(self.format(fallback))
    }

    /// Produce from one specific source, skipping the gate and the weighted
    /// draw. Scripture still honors and updates its cooldown.
    pub async fn preview<E: TextEnhancer>(
        &mut self,
        kind: SourceKind,
        event: HookEvent,
        enhancer: &E,
    ) -> Option<String> {
        let hour = chrono::Local::now().hour();
        let period = self.config.period_at(hour);
        let mut rng = StdRng::from_entropy();
        match self
            .sources
            .produce(kind, event, period, enhancer, &mut rng)
            .await
        {
            Ok(Some(candidate)) => {
                if kind == SourceKind::Scripture {
                    self.limiter.mark_shown(SCRIPTURE_CONTENT_TYPE);
                }
                Some(self.format(candidate))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(source = kind.name(), error = %e, "preview fetch failed");
                None
            }
        }
    }

    /// Candidate pool for the weighted draw: enabled sources with nonzero
    /// weight, scripture only outside its cooldown, time-of-day boosts
    /// applied additively.
    fn build_pool(&self, period: crate::config::TimePeriod) -> Vec<(SourceKind, u32)> {
        let (preferred, boost) = self.config.preferred_for(period);
        let cooldown = chrono::Duration::minutes(self.config.sources.scripture.rate_limit_minutes);

        SourceKind::ALL
            .iter()
            .copied()
            .filter(|&kind| self.config.sources.is_enabled(kind))
            .filter(|&kind| {
                kind != SourceKind::Scripture
                    || self.limiter.should_show(SCRIPTURE_CONTENT_TYPE, cooldown)
            })
            .filter_map(|kind| {
                let mut weight = self.config.sources.weight(kind);
                if weight == 0 {
                    return None;
                }
                if preferred.contains(&kind) {
                    weight += boost;
                }
                Some((kind, weight))
            })
            .collect()
    }

    fn format(&self, candidate: Candidate) -> String {
        let mut content = candidate.content;
        if !self.config.display.include_emojis {
            content = strip_emojis(&content);
        }
        // Enhanced text already carries a length instruction in its prompt
        if !candidate.enhanced {
            content = truncate_message(&content, self.config.display.max_length);
        }
        content
    }

    #[cfg(test)]
    pub(crate) fn limiter_mut(&mut self) -> &mut RateLimiter {
        &mut self.limiter
    }
}

/// Weighted random pick over the pool. `None` on an empty pool or an
/// all-zero one.
fn weighted_pick(pool: &[(SourceKind, u32)], rng: &mut impl Rng) -> Option<SourceKind> {
    let dist = WeightedIndex::new(pool.iter().map(|(_, w)| *w)).ok()?;
    Some(pool[dist.sample(rng)].0)
}

fn is_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F000}'..='\u{1FAFF}'
        | '\u{2600}'..='\u{27BF}'
        | '\u{2B00}'..='\u{2BFF}'
        | '\u{FE0F}'
        | '\u{200D}'
    )
}

fn strip_emojis(s: &str) -> String {
    let stripped: String = s.chars().filter(|c| !is_emoji(*c)).collect();
    // Collapse the doubled spaces emoji removal leaves behind
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_message(s: &str, max_length: usize) -> String {
    if s.chars().count() <= max_length {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_length.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}
