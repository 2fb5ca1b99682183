//! The built-in message source: local generation when the enhancer is
//! available, otherwise static per-event tables. This source always
//! produces something, so the selector can lean on it as the final
//! fallback.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Candidate, HookEvent, MessageKind};
use crate::config::TimePeriod;
use crate::enhance::TextEnhancer;

const SESSION_START_MESSAGES: &[&str] = &[
    "🚀 Ready to create something amazing today!",
    "💻 Your code journey begins - let's make it great!",
    "✨ Every expert was once a beginner. Keep coding!",
    "🌟 Time to turn ideas into reality through code!",
    "💪 You've got this! Let's write some awesome code!",
    "🎯 Focus, create, and enjoy the process!",
    "🔥 Another day, another opportunity to level up!",
    "🌈 Your creativity + code = endless possibilities!",
];

const STOP_MESSAGES: &[&str] = &[
    "🎉 Great work! Your efforts today matter!",
    "✅ Progress made! Every line counts!",
    "🌟 Well done! Rest and come back stronger!",
    "💯 You crushed it! Be proud of what you built!",
    "🚀 Mission accomplished! Your code looks great!",
    "🎯 Target hit! You're getting better every day!",
    "✨ Fantastic session! Your dedication shows!",
    "💪 Strong finish! Your future self will thank you!",
];

const NOTIFICATION_MESSAGES: &[&str] = &[
    "💡 Keep going! You're on the right track!",
    "🌟 Your persistence is your superpower!",
    "🚀 Every bug fixed is a lesson learned!",
    "💪 Challenge accepted, solution incoming!",
    "✨ You're doing great! Keep up the momentum!",
    "🎯 Stay focused - breakthrough is near!",
    "🔥 Your code is taking shape beautifully!",
    "🌈 Remember: progress, not perfection!",
];

pub struct DefaultSource;

impl Default for DefaultSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultSource {
    pub fn new() -> Self {
        Self
    }

    /// Try local generation, then fall back to the static tables.
    pub async fn produce<E: TextEnhancer>(
        &self,
        event: HookEvent,
        period: TimePeriod,
        enhancer: &E,
        rng: &mut (impl Rng + Send),
    ) -> Candidate {
        if enhancer.is_enabled() {
            if let Some(generated) = enhancer.generate(&prompt_for(event, period)).await {
                return Candidate::new(generated, MessageKind::Default).enhanced();
            }
        }
        self.static_message(event, rng)
    }

    /// One of the pre-written messages for the event. Infallible.
    pub fn static_message(&self, event: HookEvent, rng: &mut impl Rng) -> Candidate {
        let table = table_for(event);
        let content = table.choose(rng).copied().unwrap_or(table[0]);
        Candidate::new(content, MessageKind::Default)
    }
}

fn table_for(event: HookEvent) -> &'static [&'static str] {
    match event {
        HookEvent::SessionStart => SESSION_START_MESSAGES,
        HookEvent::Stop => STOP_MESSAGES,
        HookEvent::Notification => NOTIFICATION_MESSAGES,
    }
}

/// Session starts get a time-of-day prompt; the other events share one
/// prompt each.
fn prompt_for(event: HookEvent, period: TimePeriod) -> String {
    let prompt = match event {
        HookEvent::SessionStart => match period {
            TimePeriod::Morning => {
                "Generate a brief, encouraging morning message for a developer starting their \
                 coding session. Include one emoji. Maximum 15 words. Be positive and energizing."
            }
            TimePeriod::Afternoon => {
                "Generate a brief, encouraging afternoon message for a developer continuing \
                 their work. Include one emoji. Maximum 15 words. Be motivating and focused."
            }
            TimePeriod::Evening => {
                "Generate a brief, encouraging evening message for a developer working late. \
                 Include one emoji. Maximum 15 words. Be supportive and appreciative."
            }
        },
        HookEvent::Stop => {
            "Generate a brief, congratulatory message for a developer finishing their coding \
             work. Include one emoji. Maximum 15 words. Celebrate their effort and progress."
        }
        HookEvent::Notification => {
            "Generate a brief, encouraging message for a developer in the middle of coding. \
             Include one emoji. Maximum 15 words. Be supportive and motivating."
        }
    };
    prompt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct NoEnhancer;

    impl TextEnhancer for NoEnhancer {
        fn is_enabled(&self) -> bool {
            false
        }

        async fn generate(&self, _prompt: &str) -> Option<String> {
            None
        }
    }

    struct CannedEnhancer;

    impl TextEnhancer for CannedEnhancer {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn generate(&self, _prompt: &str) -> Option<String> {
            Some("⚡ Generated just for you.".to_string())
        }
    }

    #[test]
    fn test_static_message_comes_from_event_table() {
        let source = DefaultSource::new();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let c = source.static_message(HookEvent::Stop, &mut rng);
            assert!(STOP_MESSAGES.contains(&c.content.as_str()));
            assert_eq!(c.kind, MessageKind::Default);
        }
    }

    #[tokio::test]
    async fn test_produce_prefers_enhancer() {
        let source = DefaultSource::new();
        let mut rng = StdRng::seed_from_u64(11);
        let c = source
            .produce(
                HookEvent::SessionStart,
                TimePeriod::Morning,
                &CannedEnhancer,
                &mut rng,
            )
            .await;
        assert_eq!(c.content, "⚡ Generated just for you.");
        assert!(c.enhanced);
    }

    #[tokio::test]
    async fn test_produce_without_enhancer_uses_table() {
        let source = DefaultSource::new();
        let mut rng = StdRng::seed_from_u64(11);
        let c = source
            .produce(
                HookEvent::Notification,
                TimePeriod::Evening,
                &NoEnhancer,
                &mut rng,
            )
            .await;
        assert!(NOTIFICATION_MESSAGES.contains(&c.content.as_str()));
        assert!(!c.enhanced);
    }

    #[test]
    fn test_session_start_prompt_varies_by_period() {
        let morning = prompt_for(HookEvent::SessionStart, TimePeriod::Morning);
        let evening = prompt_for(HookEvent::SessionStart, TimePeriod::Evening);
        assert_ne!(morning, evening);
        assert!(morning.contains("morning"));
        assert!(evening.contains("evening"));
    }
}
