//! Static, immutable registry of the five pedagogical roles.
//!
//! Everything here is a process-wide singleton: the catalog is built once
//! (lazily, on first access) and shared read-only across every session.
//! No mutation path is exposed on purpose — callers that need per-session
//! behavior layer it on top in `tutorloom-conversation` / `tutorloom-assignment`.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The section a semantic unit's parent heading was classified into.
///
/// Shared with `tutorloom-segmenter`, which is the component that actually
/// assigns a `SectionKind` to each unit; the catalog only needs the type to
/// express role affinity tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Introduction,
    Body,
    Methodology,
    Conclusion,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Introduction,
        SectionKind::Body,
        SectionKind::Methodology,
        SectionKind::Conclusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::Body => "body",
            SectionKind::Methodology => "methodology",
            SectionKind::Conclusion => "conclusion",
        }
    }

    /// Classify a lowercased heading string into a section kind. Falls back
    /// to `Body` when no keyword set matches.
    pub fn classify_heading(lowered_heading: &str) -> SectionKind {
        const INTRODUCTION: &[&str] = &["introduction", "overview", "background"];
        const CONCLUSION: &[&str] = &["conclusion", "summary", "final"];
        const METHODOLOGY: &[&str] = &["method", "approach", "implementation"];

        if INTRODUCTION.iter().any(|kw| lowered_heading.contains(kw)) {
            SectionKind::Introduction
        } else if CONCLUSION.iter().any(|kw| lowered_heading.contains(kw)) {
            SectionKind::Conclusion
        } else if METHODOLOGY.iter().any(|kw| lowered_heading.contains(kw)) {
            SectionKind::Methodology
        } else {
            SectionKind::Body
        }
    }
}

/// One of the exactly five pedagogical roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Explainer,
    Challenger,
    Summarizer,
    ExampleGenerator,
    MisconceptionSpotter,
}

impl Role {
    /// All five roles, in a fixed (non-lexicographic) declaration order.
    /// Callers that need deterministic tie-breaking should sort by `name()`
    /// explicitly rather than relying on this order.
    pub const ALL: [Role; 5] = [
        Role::Explainer,
        Role::Challenger,
        Role::Summarizer,
        Role::ExampleGenerator,
        Role::MisconceptionSpotter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Explainer => "Explainer",
            Role::Challenger => "Challenger",
            Role::Summarizer => "Summarizer",
            Role::ExampleGenerator => "Example-Generator",
            Role::MisconceptionSpotter => "Misconception-Spotter",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable definition of a single role, as shipped in the catalog.
#[derive(Debug, Clone)]
pub struct RoleDef {
    pub role: Role,
    pub system_prompt: &'static str,
    pub base_weight: f32,
    pub priority_keywords: BTreeSet<&'static str>,
    pub avoid_keywords: BTreeSet<&'static str>,
    pub affinity_tags: BTreeSet<SectionKind>,
    pub temperature: f32,
}

fn set(items: &[&'static str]) -> BTreeSet<&'static str> {
    items.iter().copied().collect()
}

fn tags(items: &[SectionKind]) -> BTreeSet<SectionKind> {
    items.iter().copied().collect()
}

static CATALOG: Lazy<[RoleDef; 5]> = Lazy::new(|| {
    [
        RoleDef {
            role: Role::Explainer,
            system_prompt: "You are the Explainer. Ground the learner in the core concept of \
the current unit using plain, precise language. Define terms before you use them, build from \
what was already established, and avoid introducing objections or alternative framings — that \
is another role's job. Keep the explanation self-contained.",
            base_weight: 8.0,
            priority_keywords: set(&[
                "define", "definition", "means", "refers to", "concept", "basics", "fundamental",
            ]),
            avoid_keywords: set(&["disagree", "wrong"]),
            affinity_tags: tags(&[SectionKind::Introduction, SectionKind::Methodology]),
            temperature: 0.0,
        },
        RoleDef {
            role: Role::Challenger,
            system_prompt: "You are the Challenger. Push back on the unit's claims with a \
pointed, good-faith question or counter-scenario. Your goal is to make the learner defend or \
refine their understanding, not to be contrarian for its own sake. Never restate the unit — \
probe it.",
            base_weight: 6.5,
            priority_keywords: set(&[
                "assume", "assumption", "however", "but", "limitation", "tradeoff", "counter",
            ]),
            avoid_keywords: set(&["summary", "recap"]),
            affinity_tags: tags(&[SectionKind::Body]),
            temperature: 0.15,
        },
        RoleDef {
            role: Role::Summarizer,
            system_prompt: "You are the Summarizer. Compress the unit into its load-bearing \
points in as few sentences as possible. Favor bullet-like density over narrative flourish. Do \
not introduce new claims the unit did not make.",
            base_weight: 8.5,
            priority_keywords: set(&["summary", "overall", "in short", "key point", "recap"]),
            avoid_keywords: set(&["example", "for instance"]),
            affinity_tags: tags(&[SectionKind::Introduction, SectionKind::Conclusion]),
            temperature: 0.0,
        },
        RoleDef {
            role: Role::ExampleGenerator,
            system_prompt: "You are the Example-Generator. Produce one concrete, specific \
example that instantiates the unit's idea in a real-world or worked scenario. Prefer a single \
strong example over several shallow ones. Tie it explicitly back to the unit's terminology.",
            base_weight: 7.0,
            priority_keywords: set(&[
                "for example", "for instance", "such as", "illustration", "case study",
            ]),
            avoid_keywords: set(&["abstract", "theoretical"]),
            affinity_tags: tags(&[SectionKind::Body, SectionKind::Methodology]),
            temperature: 0.15,
        },
        RoleDef {
            role: Role::MisconceptionSpotter,
            system_prompt: "You are the Misconception-Spotter. Name one common misunderstanding \
learners have about this unit's idea and correct it directly. Be specific about what the wrong \
belief sounds like, then state the correct version plainly.",
            base_weight: 7.5,
            priority_keywords: set(&[
                "common mistake", "misconception", "confused with", "often thought", "incorrectly",
            ]),
            avoid_keywords: set(&[]),
            affinity_tags: tags(&[SectionKind::Methodology]),
            temperature: 0.0,
        },
    ]
});

/// Look up a role's immutable definition.
pub fn lookup(role: Role) -> &'static RoleDef {
    CATALOG.iter().find(|d| d.role == role).expect("catalog always defines all five roles")
}

/// Enumerate all five role definitions, in catalog declaration order.
pub fn all() -> &'static [RoleDef; 5] {
    &CATALOG
}

/// Roles sorted lexicographically by display name — the tie-break order used
/// throughout the assignment and reallocation engines.
pub fn all_by_name() -> [Role; 5] {
    let mut roles = Role::ALL;
    roles.sort_by_key(|r| r.name());
    roles
}
