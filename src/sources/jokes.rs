//! Jokes and quotes from public, keyless APIs. Each upstream has its own
//! payload shape; the parse functions below are the only place those shapes
//! are known.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Candidate, HookEvent, MessageKind, SourceError};
use crate::api::ApiClient;
use crate::enhance::TextEnhancer;

/// One upstream API, in the order-independent pool we draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upstream {
    DadJoke,
    ProgrammingJoke,
    InspirationalQuote,
    ChuckNorris,
}

struct Endpoints {
    dad_joke: String,
    programming_joke: String,
    official_joke: String,
    chuck_norris: String,
    zenquotes: String,
    quote_garden: String,
}

impl Endpoints {
    fn public() -> Self {
        Self {
            dad_joke: "https://icanhazdadjoke.com/".into(),
            programming_joke: "https://v2.jokeapi.dev/joke/Programming".into(),
            official_joke: "https://official-joke-api.appspot.com/jokes/programming/random".into(),
            chuck_norris: "https://api.chucknorris.io/jokes/random".into(),
            zenquotes: "https://zenquotes.io/api/random".into(),
            quote_garden: "https://quote-garden.herokuapp.com/api/v3/quotes/random".into(),
        }
    }

    /// Relative paths, joined onto a test client's base URL.
    #[cfg(test)]
    fn relative() -> Self {
        Self {
            dad_joke: "/dadjoke".into(),
            programming_joke: "/jokeapi".into(),
            official_joke: "/official".into(),
            chuck_norris: "/chuck".into(),
            zenquotes: "/zen".into(),
            quote_garden: "/garden".into(),
        }
    }
}

/// Provider for the external joke/quote APIs. Tries upstreams in random
/// order and returns the first one that yields usable content.
pub struct ExternalSource {
    client: ApiClient,
    endpoints: Endpoints,
}

impl ExternalSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            endpoints: Endpoints::public(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base(client: ApiClient) -> Self {
        Self {
            client,
            endpoints: Endpoints::relative(),
        }
    }

    pub async fn produce<E: TextEnhancer>(
        &self,
        event: HookEvent,
        enhancer: &E,
        rng: &mut (impl Rng + Send),
    ) -> Result<Option<Candidate>, SourceError> {
        let mut order = [
            Upstream::DadJoke,
            Upstream::ProgrammingJoke,
            Upstream::InspirationalQuote,
            Upstream::ChuckNorris,
        ];
        order.shuffle(rng);

        for upstream in order {
            match self.fetch(upstream).await {
                Ok(Some(candidate)) => {
                    return Ok(Some(self.finish(candidate, event, enhancer).await));
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(upstream = ?upstream, error = %e, "external API unavailable");
                }
            }
        }
        // Every upstream is down or unusable; serve from the built-in tables
        Ok(Some(builtin_message(rng)))
    }

    async fn fetch(&self, upstream: Upstream) -> Result<Option<Candidate>, crate::api::FetchError> {
        let e = &self.endpoints;
        let raw = match upstream {
            Upstream::DadJoke => {
                self.client
                    .get(&e.dad_joke, &[], &[("Accept", "application/json")], true)
                    .await?
            }
            Upstream::ProgrammingJoke => {
                let params = [("safe-mode".to_string(), String::new())];
                match self.client.get(&e.programming_joke, &params, &[], true).await {
                    Ok(raw) => raw,
                    // jokeapi is flaky; fall back to the official joke API
                    Err(_) => self.client.get(&e.official_joke, &[], &[], true).await?,
                }
            }
            Upstream::ChuckNorris => {
                let params = [("category".to_string(), "dev".to_string())];
                self.client.get(&e.chuck_norris, &params, &[], true).await?
            }
            Upstream::InspirationalQuote => {
                match self.client.get(&e.zenquotes, &[], &[], true).await {
                    Ok(raw) => raw,
                    Err(_) => self.client.get(&e.quote_garden, &[], &[], true).await?,
                }
            }
        };
        let Some(json) = raw.as_json() else {
            return Ok(None);
        };
        Ok(match upstream {
            Upstream::DadJoke => parse_dad_joke(json),
            Upstream::ProgrammingJoke => {
                parse_jokeapi(json).or_else(|| parse_official_joke(json))
            }
            Upstream::ChuckNorris => parse_chuck_norris(json),
            Upstream::InspirationalQuote => {
                parse_zenquotes(json).or_else(|| parse_quote_garden(json))
            }
        })
    }

    /// Rephrase through the enhancer when available, otherwise decorate the
    /// raw content.
    async fn finish<E: TextEnhancer>(
        &self,
        candidate: Candidate,
        event: HookEvent,
        enhancer: &E,
    ) -> Candidate {
        if enhancer.is_enabled() {
            let prompt = enhance_prompt(&candidate, event);
            if let Some(text) = enhancer.generate(&prompt).await {
                return Candidate::new(text, candidate.kind).enhanced();
            }
        }
        decorate(candidate)
    }
}

fn enhance_prompt(candidate: &Candidate, event: HookEvent) -> String {
    let event_name = event.hook_name().to_lowercase();
    match candidate.kind {
        MessageKind::Quote => format!(
            "Here's a quote: \"{}\" - {}\n\n\
             Create a brief developer encouragement inspired by this quote for a {event_name} event.\n\
             Maximum 20 words. Include one emoji. Make it practical, motivating, and add a touch \
             of coding humor. Only output the message, no metadata.",
            candidate.content,
            candidate.author.as_deref().unwrap_or("Unknown"),
        ),
        _ => format!(
            "Here's a joke: \"{}\"\n\n\
             Rephrase this as a brief, encouraging message for a developer during their \
             {event_name} event.\n\
             Make it light-hearted, humorous, and motivating. Maximum 20 words. Include one \
             emoji. Only output the message, no metadata.",
            candidate.content,
        ),
    }
}

fn decorate(candidate: Candidate) -> Candidate {
    let content = match candidate.kind {
        MessageKind::Quote => format!(
            "💭 \"{}\" - {}",
            candidate.content,
            candidate.author.as_deref().unwrap_or("Unknown"),
        ),
        _ => format!("😄 {}", candidate.content),
    };
    Candidate {
        content,
        ..candidate
    }
}

/// Built-in jokes served when no API is reachable.
const BUILTIN_JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs! 🐛",
    "A SQL query walks into a bar, sees two tables and asks: 'Can I join you?' 🍺",
    "Why did the developer quit? Because they didn't get arrays! 💰",
    "How many programmers does it take to change a light bulb? None, it's a hardware problem! 💡",
    "Why do Java developers wear glasses? Because they can't C#! 👓",
    "There are only 10 types of people: those who understand binary and those who don't! 🤓",
    "Why did the programmer go broke? Because he used up all his cache! 💸",
    "What's a programmer's favorite hangout place? The Foo Bar! 🍻",
    "Why was the JavaScript developer sad? Because they didn't Node how to Express themselves! 😢",
    "How do you comfort a JavaScript bug? You console it! 🎮",
];

/// Built-in quotes for the same situation.
const BUILTIN_QUOTES: &[(&str, &str)] = &[
    ("First, solve the problem. Then, write the code.", "John Johnson"),
    ("Experience is the name everyone gives to their mistakes.", "Oscar Wilde"),
    ("The best way to predict the future is to implement it.", "David Heinemeier Hansson"),
    ("Code is like humor. When you have to explain it, it's bad.", "Cory House"),
    ("Programming is thinking, not typing.", "Casey Patton"),
];

/// One message from the built-in tables, jokes and quotes pooled together.
fn builtin_message(rng: &mut impl Rng) -> Candidate {
    let pick = rng.gen_range(0..BUILTIN_JOKES.len() + BUILTIN_QUOTES.len());
    match pick.checked_sub(BUILTIN_JOKES.len()) {
        None => Candidate::new(BUILTIN_JOKES[pick], MessageKind::Joke),
        Some(i) => {
            let (text, author) = BUILTIN_QUOTES[i];
            decorate(Candidate::new(text, MessageKind::Quote).with_author(author))
        }
    }
}

fn nonempty(value: &serde_json::Value, field: &str) -> Option<String> {
    let s = value.get(field)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// icanhazdadjoke: `{"joke": "..."}`
fn parse_dad_joke(json: &serde_json::Value) -> Option<Candidate> {
    Some(Candidate::new(nonempty(json, "joke")?, MessageKind::Joke))
}

/// jokeapi v2: `{"type": "single", "joke": ...}` or
/// `{"type": "twopart", "setup": ..., "delivery": ...}`
fn parse_jokeapi(json: &serde_json::Value) -> Option<Candidate> {
    match json.get("type")?.as_str()? {
        "single" => Some(Candidate::new(nonempty(json, "joke")?, MessageKind::Joke)),
        "twopart" => {
            let setup = nonempty(json, "setup")?;
            let delivery = nonempty(json, "delivery")?;
            Some(Candidate::new(
                format!("{setup} {delivery}"),
                MessageKind::Joke,
            ))
        }
        _ => None,
    }
}

/// official-joke-api: `[{"setup": ..., "punchline": ...}]`
fn parse_official_joke(json: &serde_json::Value) -> Option<Candidate> {
    let first = json.as_array()?.first()?;
    let setup = nonempty(first, "setup")?;
    let punchline = nonempty(first, "punchline")?;
    Some(Candidate::new(
        format!("{setup} {punchline}"),
        MessageKind::Joke,
    ))
}

/// chucknorris.io: `{"value": "..."}`
fn parse_chuck_norris(json: &serde_json::Value) -> Option<Candidate> {
    Some(Candidate::new(nonempty(json, "value")?, MessageKind::Joke))
}

/// zenquotes: `[{"q": ..., "a": ...}]`
fn parse_zenquotes(json: &serde_json::Value) -> Option<Candidate> {
    let first = json.as_array()?.first()?;
    let text = nonempty(first, "q")?;
    let author = nonempty(first, "a").unwrap_or_else(|| "Unknown".to_string());
    Some(Candidate::new(text, MessageKind::Quote).with_author(author))
}

/// quote garden: `{"data": [{"quoteText": ..., "quoteAuthor": ...}]}`
fn parse_quote_garden(json: &serde_json::Value) -> Option<Candidate> {
    let first = json.get("data")?.as_array()?.first()?;
    let text = nonempty(first, "quoteText")?;
    let author = nonempty(first, "quoteAuthor").unwrap_or_else(|| "Unknown".to_string());
    Some(Candidate::new(text, MessageKind::Quote).with_author(author))
}
