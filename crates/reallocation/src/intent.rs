use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of user-interruption intents (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Clarification,
    Objection,
    ExampleRequest,
    DepthRequest,
    SummaryRequest,
    TopicPivot,
    Other,
}

impl Intent {
    /// Fixed tie-break priority, highest first (spec §4.E).
    pub const PRIORITY: [Intent; 7] = [
        Intent::Clarification,
        Intent::Objection,
        Intent::ExampleRequest,
        Intent::DepthRequest,
        Intent::SummaryRequest,
        Intent::TopicPivot,
        Intent::Other,
    ];
}

/// A classified intent with its pattern-match confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
}

/// Reallocation is triggered only above this confidence (spec §4.E).
pub const RELOCATION_CONFIDENCE_THRESHOLD: f32 = 0.7;

struct PatternFamily {
    intent: Intent,
    patterns: &'static [&'static str],
}

static FAMILIES: Lazy<Vec<(Intent, Vec<Regex>)>> = Lazy::new(|| {
    const RAW: &[PatternFamily] = &[
        PatternFamily {
            intent: Intent::Clarification,
            patterns: &["explain.*more", "don'?t understand", "clarify", "what.*mean", "simpler", "confused"],
        },
        PatternFamily {
            intent: Intent::Objection,
            patterns: &["disagree", "doesn'?t (sound|seem) right", "but.*what if", "wrong", "incorrect"],
        },
        PatternFamily {
            intent: Intent::ExampleRequest,
            patterns: &["example", "concrete", "real.*world", "illustrate", "instance", "demonstrate"],
        },
        PatternFamily {
            intent: Intent::DepthRequest,
            patterns: &["deeper", "tell.*more", "elaborate", "more.*detail", "expand on"],
        },
        PatternFamily {
            intent: Intent::SummaryRequest,
            patterns: &["summarize", "recap", "key.*point", "main.*idea", "in.*short"],
        },
        PatternFamily {
            intent: Intent::TopicPivot,
            patterns: &[
                "let'?s.*talk.*about",
                "skip.*to",
                "next.*topic",
                "change.*subject",
                "move on",
            ],
        },
    ];

    RAW.iter()
        .map(|family| {
            let compiled: Vec<Regex> = family
                .patterns
                .iter()
                .map(|p| Regex::new(&format!("(?im){p}")).expect("pattern family regex is valid"))
                .collect();
            (family.intent, compiled)
        })
        .collect()
});

/// Classify a user interruption message (spec §4.E). Lowercases the input
/// and matches each intent's keyword-pattern family; confidence is the
/// fraction of that family's patterns that matched. Stable under trailing
/// whitespace and case per spec §8 property 7.
pub fn classify(text: &str) -> IntentClassification {
    let lowered = text.to_lowercase();

    let scored: Vec<(Intent, f32)> = FAMILIES
        .iter()
        .map(|(intent, patterns)| {
            let hits = patterns.iter().filter(|re| re.is_match(&lowered)).count();
            (*intent, hits as f32 / patterns.len() as f32)
        })
        .collect();

    let best = scored
        .iter()
        .cloned()
        .max_by(|(a_intent, a_conf), (b_intent, b_conf)| {
            a_conf
                .partial_cmp(b_conf)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| priority_rank(*b_intent).cmp(&priority_rank(*a_intent)))
        });

    match best {
        Some((intent, confidence)) if confidence > 0.0 => IntentClassification { intent, confidence },
        // No pattern family matched at all: `Other` is the "no match" case
        // (spec §4.E), so it gets zero confidence rather than a manufactured
        // 1.0 — a confidence of 1.0 here would clear the reallocation
        // threshold and rewrite the queue on a message that matched
        // nothing, which is backwards (spec §4.E: "An intent triggers
        // reallocation only if confidence >= 0.7").
        _ => IntentClassification { intent: Intent::Other, confidence: 0.0 },
    }
}

fn priority_rank(intent: Intent) -> usize {
    Intent::PRIORITY.iter().position(|i| *i == intent).unwrap_or(usize::MAX)
}
