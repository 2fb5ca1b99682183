//! Stoic wisdom: a curated quote table, a set of general principles, and
//! optional fresh generation through the local enhancer.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Candidate, MessageKind, SourceError};
use crate::enhance::TextEnhancer;

struct StoicQuote {
    text: &'static str,
    author: &'static str,
    theme: &'static str,
}

const QUOTES: &[StoicQuote] = &[
    StoicQuote {
        text: "You have power over your mind - not outside events. Realize this, and you will find strength.",
        author: "Marcus Aurelius",
        theme: "control",
    },
    StoicQuote {
        text: "The best revenge is not to be like your enemy.",
        author: "Marcus Aurelius",
        theme: "anger",
    },
    StoicQuote {
        text: "How much more harmful are the consequences of anger than the causes of it.",
        author: "Marcus Aurelius",
        theme: "anger",
    },
    StoicQuote {
        text: "The happiness of your life depends upon the quality of your thoughts.",
        author: "Marcus Aurelius",
        theme: "peace",
    },
    StoicQuote {
        text: "The impediment to action advances action. What stands in the way becomes the way.",
        author: "Marcus Aurelius",
        theme: "obstacles",
    },
    StoicQuote {
        text: "Confine yourself to the present.",
        author: "Marcus Aurelius",
        theme: "focus",
    },
    StoicQuote {
        text: "Waste no more time arguing about what a good person should be. Be one.",
        author: "Marcus Aurelius",
        theme: "action",
    },
    StoicQuote {
        text: "Choose not to be harmed — and you won't feel harmed. Don't feel harmed — and you haven't been.",
        author: "Marcus Aurelius",
        theme: "resilience",
    },
    StoicQuote {
        text: "It's not what happens to you, but how you react to it that matters.",
        author: "Epictetus",
        theme: "control",
    },
    StoicQuote {
        text: "Any person capable of angering you becomes your master.",
        author: "Epictetus",
        theme: "anger",
    },
    StoicQuote {
        text: "First say to yourself what you would be; and then do what you have to do.",
        author: "Epictetus",
        theme: "discipline",
    },
    StoicQuote {
        text: "No person is free who is not master of himself.",
        author: "Epictetus",
        theme: "control",
    },
    StoicQuote {
        text: "The greatest remedy for anger is delay.",
        author: "Seneca",
        theme: "anger",
    },
    StoicQuote {
        text: "We suffer more often in imagination than in reality.",
        author: "Seneca",
        theme: "worry",
    },
    StoicQuote {
        text: "Difficulties strengthen the mind, as labor does the body.",
        author: "Seneca",
        theme: "obstacles",
    },
    StoicQuote {
        text: "True happiness is to enjoy the present, without anxious dependence upon the future.",
        author: "Seneca",
        theme: "peace",
    },
    StoicQuote {
        text: "If a person doesn't know to which port they sail, no wind is favorable.",
        author: "Seneca",
        theme: "purpose",
    },
    StoicQuote {
        text: "Every new beginning comes from some other beginning's end.",
        author: "Seneca",
        theme: "change",
    },
    StoicQuote {
        text: "The obstacle is the way.",
        author: "Ryan Holiday",
        theme: "obstacles",
    },
    StoicQuote {
        text: "Between stimulus and response there is a space. In that space is our power to choose our response.",
        author: "Viktor Frankl",
        theme: "control",
    },
];

const GENERAL_WISDOM: &[&str] = &[
    "The obstacle is not against you; it simply is. Your reaction determines your growth.",
    "Control your emotions, not others' opinions.",
    "Difficulties are inevitable. Your calm response is optional.",
    "The challenge doesn't care about your frustration. Handle it with clarity.",
    "Master your anxiety, and you master your life.",
    "Failure reveals truth. Your anger at it reveals weakness.",
    "Your circumstances do not control your inner peace. Your discipline does.",
    "The situation is what it is. Your approach to it defines you.",
    "Others' words don't create your reality. Your interpretation does.",
    "Life's lessons are teachers, not enemies. Learn without anger.",
];

// Chance of serving a general principle instead of an attributed quote
const GENERAL_WISDOM_RATIO: f64 = 0.25;

/// Provider for stoic quotes and generated wisdom. Never touches the
/// network and never fails.
pub struct StoicSource {
    pure_generation_ratio: f64,
}

impl StoicSource {
    pub fn new(pure_generation_ratio: f64) -> Self {
        Self {
            pure_generation_ratio,
        }
    }

    pub async fn produce<E: TextEnhancer>(
        &self,
        enhancer: &E,
        rng: &mut (impl Rng + Send),
    ) -> Result<Option<Candidate>, SourceError> {
        if enhancer.is_enabled() && rng.gen::<f64>() < self.pure_generation_ratio {
            if let Some(generated) = enhancer.generate(&generation_prompt(None)).await {
                return Ok(Some(Candidate::new(generated, MessageKind::Stoic).enhanced()));
            }
            // Generation failed; fall back to the quote table
        }

        if rng.gen::<f64>() < GENERAL_WISDOM_RATIO {
            let wisdom = GENERAL_WISDOM.choose(rng).copied().unwrap_or(GENERAL_WISDOM[0]);
            return Ok(Some(Candidate::new(
                format!("🧘 {wisdom}"),
                MessageKind::Stoic,
            )));
        }

        Ok(Some(quote_message(pick_quote(None, rng))))
    }
}

fn pick_quote(theme: Option<&str>, rng: &mut impl Rng) -> &'static StoicQuote {
    if let Some(theme) = theme {
        let themed: Vec<&'static StoicQuote> =
            QUOTES.iter().filter(|q| q.theme == theme).collect();
        if let Some(quote) = themed.choose(rng) {
            return *quote;
        }
        // Unknown theme falls back to the full table
    }
    QUOTES.choose(rng).unwrap_or(&QUOTES[0])
}

fn quote_message(quote: &StoicQuote) -> Candidate {
    Candidate::new(
        format!("🧘 \"{}\" - {}", quote.text, quote.author),
        MessageKind::Stoic,
    )
    .with_author(quote.author)
}

fn generation_prompt(theme: Option<&str>) -> String {
    let theme_context = match theme {
        Some("anger") => "Focus on managing anger and maintaining composure.",
        Some("control") => "Focus on what we can control versus what we cannot.",
        Some("peace") => "Focus on finding inner peace and tranquility.",
        Some("obstacles") => "Focus on viewing obstacles as opportunities for growth.",
        _ => "Focus on timeless stoic wisdom.",
    };
    format!(
        "Generate original stoic wisdom. {theme_context}\n\n\
         Write a brief, practical stoic principle for daily life.\n\
         Maximum 20 words. Include one zen/calm emoji (🧘, 💭, 🌊, ⚖️, or 🎯).\n\
         Make it sound like wisdom from Marcus Aurelius, Epictetus, or Seneca.\n\
         Do not quote existing stoics - create new wisdom in their style.\n\
         Only output the wisdom statement, no metadata or attribution."
    )
}
