//! Daily scripture text from wol.jw.org, turned into a short encouragement.
//! The endpoint serves one JSON document per calendar date.

use chrono::{Datelike, Duration, Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{Candidate, MessageKind, SourceError};
use crate::api::ApiClient;
use crate::config::TimePeriod;
use crate::enhance::TextEnhancer;

const PUBLIC_BASE: &str = "https://wol.jw.org/wol/dt/r1/lp-e";
const PREFERRED_PUBLICATION: &str = "Examining the Scriptures Daily";

/// One day's text, after tag stripping.
#[derive(Debug, Clone, PartialEq)]
struct DailyText {
    title: String,
    scripture: String,
    commentary: String,
}

pub struct ScriptureSource {
    client: ApiClient,
    base_url: String,
}

impl ScriptureSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: PUBLIC_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base(client: ApiClient, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn produce<E: TextEnhancer>(
        &self,
        period: TimePeriod,
        enhancer: &E,
        rng: &mut (impl Rng + Send),
    ) -> Result<Option<Candidate>, SourceError> {
        let date = pick_date(period, Local::now().date_naive(), rng);
        let url = format!(
            "{}/{}/{}/{}",
            self.base_url,
            date.year(),
            date.month(),
            date.day()
        );

        let raw = self.client.get(&url, &[], &[], true).await?;
        let Some(json) = raw.as_json() else {
            return Err(SourceError::Shape("daily text body is not JSON".into()));
        };
        let Some(text) = parse_daily_text(json) else {
            return Err(SourceError::Shape("no usable daily text item".into()));
        };

        if enhancer.is_enabled() {
            if let Some(generated) = enhancer.generate(&enhance_prompt(&text)).await {
                return Ok(Some(
                    Candidate::new(generated, MessageKind::Scripture).enhanced(),
                ));
            }
        }
        Ok(Some(Candidate::new(
            fallback_message(&text, rng),
            MessageKind::Scripture,
        )))
    }
}

/// Morning sessions get today's text. Later in the day there is a 30%
/// chance of revisiting a random text from the last two weeks.
fn pick_date(period: TimePeriod, today: NaiveDate, rng: &mut impl Rng) -> NaiveDate {
    if period != TimePeriod::Morning && rng.gen::<f64>() < 0.3 {
        let days_back = rng.gen_range(1..=14);
        return today - Duration::days(days_back);
    }
    today
}

fn parse_daily_text(json: &serde_json::Value) -> Option<DailyText> {
    let items = json.get("items")?.as_array()?;
    let preferred = items.iter().find(|item| {
        item.get("englishSymbol")
            .and_then(|v| v.as_str())
            .is_some_and(|s| s.starts_with("es"))
            && item
                .get("publicationTitle")
                .and_then(|v| v.as_str())
                .is_some_and(|s| s.contains(PREFERRED_PUBLICATION))
    });
    let item = preferred.or_else(|| items.first())?;

    let title = strip_tags(item.get("title").and_then(|v| v.as_str()).unwrap_or(""));
    let content = strip_tags(item.get("content").and_then(|v| v.as_str()).unwrap_or(""));

    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    let scripture = lines.next().unwrap_or("").to_string();
    let commentary = lines.collect::<Vec<_>>().join("\n");

    if title.is_empty() && scripture.is_empty() {
        return None;
    }
    Some(DailyText {
        title,
        scripture,
        commentary,
    })
}

/// Drop HTML tags and decode the handful of entities the endpoint emits.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

fn enhance_prompt(text: &DailyText) -> String {
    let basis = if text.scripture.is_empty() {
        &text.title
    } else {
        &text.scripture
    };
    let commentary = if text.commentary.is_empty() {
        "N/A".to_string()
    } else {
        truncate_chars(&text.commentary, 200)
    };
    format!(
        "Based on this daily text: \"{basis}\"\n\n\
         Commentary: {commentary}\n\n\
         Create a brief, encouraging message for a software developer that relates this wisdom \
         to their coding journey.\n\
         Maximum 20 words. Include one appropriate emoji. Focus on practical encouragement."
    )
}

fn fallback_message(text: &DailyText, rng: &mut impl Rng) -> String {
    let title = truncate_chars(&text.title, 50);
    let scripture = truncate_chars(&text.scripture, 40);
    let messages = [
        format!("📖 Today's wisdom: {title}... Apply it in your code!"),
        "💡 Like today's text teaches, persevere in your coding journey!".to_string(),
        format!("🌟 Reflect on: {scripture}... while you create!"),
        "💪 Draw strength from today's text as you tackle challenges!".to_string(),
        "🎯 Apply today's lesson: Code with purpose and integrity!".to_string(),
    ];
    messages
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| messages[0].clone())
}

/// Char-boundary-safe prefix.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "items": [
                {
                    "englishSymbol": "w24",
                    "publicationTitle": "The Watchtower",
                    "title": "<em>Other item</em>",
                    "content": "<p>Not the one.</p>"
                },
                {
                    "englishSymbol": "es24",
                    "publicationTitle": "Examining the Scriptures Daily—2024",
                    "title": "<em>Let your light shine.</em>",
                    "content": "<p><em>Let your light shine.</em>&mdash;Matt. 5:16.</p>\n<p>What we do matters more than what we say.</p>"
                }
            ]
        })
    }

    #[test]
    fn test_parse_prefers_examining_the_scriptures() {
        let text = parse_daily_text(&payload()).unwrap();
        assert_eq!(text.title, "Let your light shine.");
        assert!(text.scripture.starts_with("Let your light shine."));
        assert_eq!(text.commentary, "What we do matters more than what we say.");
    }

    #[test]
    fn test_parse_falls_back_to_first_item() {
        let json = json!({
            "items": [
                {"englishSymbol": "w24", "publicationTitle": "Other", "title": "Alt title", "content": "Alt content"}
            ]
        });
        let text = parse_daily_text(&json).unwrap();
        assert_eq!(text.title, "Alt title");
        assert_eq!(text.scripture, "Alt content");
    }

    #[test]
    fn test_parse_empty_items_is_none() {
        assert!(parse_daily_text(&json!({"items": []})).is_none());
        assert!(parse_daily_text(&json!({"error": "nope"})).is_none());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Hello <em>there</em>&nbsp;&amp; welcome</p>"),
            "Hello there & welcome"
        );
        assert_eq!(strip_tags("no tags"), "no tags");
    }

    #[test]
    fn test_morning_always_uses_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(pick_date(TimePeriod::Morning, today, &mut rng), today);
        }
    }

    #[test]
    fn test_afternoon_sometimes_revisits_recent_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut past_count = 0;
        for _ in 0..500 {
            let date = pick_date(TimePeriod::Afternoon, today, &mut rng);
            if date != today {
                past_count += 1;
                let back = (today - date).num_days();
                assert!((1..=14).contains(&back));
            }
        }
        // ~30% of draws, with generous slack for the seed
        assert!((50..450).contains(&past_count), "past_count = {past_count}");
    }

    #[tokio::test]
    async fn test_produce_against_mock_endpoint() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use crate::api::{ApiClient, CacheStore, RetryPolicy};

        struct NoEnhancer;

        impl TextEnhancer for NoEnhancer {
            fn is_enabled(&self) -> bool {
                false
            }

            async fn generate(&self, _prompt: &str) -> Option<String> {
                None
            }
        }

        let server = MockServer::start().await;
        // The date path segment depends on the clock, so match every GET
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .mount(&server)
            .await;

        let client = ApiClient::new(
            None,
            std::time::Duration::from_secs(2),
            RetryPolicy {
                max_retries: 0,
                ..RetryPolicy::default()
            },
            CacheStore::in_memory(),
            chrono::Duration::minutes(5),
        )
        .unwrap();
        let source = ScriptureSource::with_base(client, server.uri());

        let mut rng = StdRng::seed_from_u64(1);
        let candidate = source
            .produce(TimePeriod::Morning, &NoEnhancer, &mut rng)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.kind, MessageKind::Scripture);
        assert!(!candidate.content.is_empty());
        assert!(!candidate.enhanced);
    }

    #[test]
    fn test_fallback_message_is_nonempty() {
        let text = DailyText {
            title: "A title".into(),
            scripture: "A verse".into(),
            commentary: String::new(),
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert!(!fallback_message(&text, &mut rng).is_empty());
        }
    }
}
