//! Content policy for generated explanations.
//!
//! Generated text must never contain sacred text, Arabic script, scripture
//! references, echoed instructions, or the supporting text it was grounded
//! on. The checks are substring and script heuristics, not semantic
//! classification: they catch the common failure modes of small instruct
//! models, nothing more.
//!
//! Rules are evaluated in order and all of them run, so a verdict lists
//! every reason that applies.

use serde::Serialize;

pub const MIN_CHARS: usize = 20;

/// Supporting texts shorter than this are too generic to flag as leaked.
const MIN_ECHO_CHARS: usize = 12;

const ARABIC_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

const VERSE_MARKERS: &[&str] = &["sourate", "ayah", "verset", "quran", "coran", "سورة", "آية"];

const INSTRUCTION_WORDS: &[&str] = &[
    "explique",
    "parle",
    "réponds",
    "uniquement",
    "français",
    "phrases",
    "court",
    "simplement",
    "comment",
    "une personne ressent",
];

const INSTRUCTION_ECHO_THRESHOLD: usize = 3;

const PROMPT_ECHO: &str = "une personne ressent de la";

/// What a rule sees: the sanitized text, its lowercase form, and the
/// supporting text the generation was grounded on.
#[derive(Debug)]
pub struct SafetyInput<'a> {
    pub text: &'a str,
    pub lowered: String,
    pub supporting_text: Option<&'a str>,
}

impl<'a> SafetyInput<'a> {
    pub fn new(text: &'a str, supporting_text: Option<&'a str>) -> Self {
        Self {
            text,
            lowered: text.trim().to_lowercase(),
            supporting_text,
        }
    }
}

type Predicate = Box<dyn Fn(&SafetyInput<'_>) -> bool + Send + Sync>;

/// A named rejection predicate. `rejects` returns true when the text
/// violates the rule.
pub struct SafetyRule {
    name: &'static str,
    rejects: Predicate,
}

impl SafetyRule {
    pub fn new(
        name: &'static str,
        rejects: impl Fn(&SafetyInput<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { name, rejects: Box::new(rejects) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for SafetyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyRule").field("name", &self.name).finish()
    }
}

/// Outcome of a policy check. Reasons are for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub reasons: Vec<&'static str>,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn rejected_by(&self, rule: &str) -> bool {
        self.reasons.iter().any(|r| *r == rule)
    }
}

/// Ordered list of rules.
#[derive(Debug)]
pub struct SafetyPolicy {
    rules: Vec<SafetyRule>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                SafetyRule::new("too_short", |i| i.text.trim().chars().count() < MIN_CHARS),
                SafetyRule::new("empty", |i| i.text.trim().is_empty()),
                SafetyRule::new("arabic_script", |i| i.text.chars().any(|c| ARABIC_BLOCK.contains(&c))),
                SafetyRule::new("verse_marker", |i| VERSE_MARKERS.iter().any(|m| i.lowered.contains(m))),
                SafetyRule::new("instruction_prefix", |i| {
                    INSTRUCTION_WORDS.iter().any(|w| i.lowered.starts_with(w))
                }),
                SafetyRule::new("instruction_echo", |i| {
                    INSTRUCTION_WORDS.iter().filter(|w| i.lowered.contains(*w)).count()
                        >= INSTRUCTION_ECHO_THRESHOLD
                }),
                SafetyRule::new("prompt_echo", |i| i.lowered.contains(PROMPT_ECHO)),
                SafetyRule::new("supporting_text_echo", echoes_supporting_text),
            ],
        }
    }
}

fn echoes_supporting_text(input: &SafetyInput<'_>) -> bool {
    let Some(support) = input.supporting_text.map(str::trim) else {
        return false;
    };
    support.chars().count() >= MIN_ECHO_CHARS && input.lowered.contains(&support.to_lowercase())
}

impl SafetyPolicy {
    /// Policy without any rule; everything passes.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule, evaluated after the existing ones.
    pub fn with_rule(mut self, rule: SafetyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(SafetyRule::name).collect()
    }

    pub fn check(&self, text: &str, supporting_text: Option<&str>) -> Verdict {
        let input = SafetyInput::new(text, supporting_text);
        let reasons = self
            .rules
            .iter()
            .filter(|rule| (rule.rejects)(&input))
            .map(SafetyRule::name)
            .collect();
        Verdict { reasons }
    }
}
