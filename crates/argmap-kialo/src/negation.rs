//! Counter-statement generation.
//!
//! The extractor only sees the [`Negator`] trait. The crate ships a
//! deterministic rule-based implementation; the CLI adds an LLM-backed one.

use serde::{Deserialize, Serialize};

use crate::error::NegationError;

/// Identifies the model that produced generated statements. Recorded verbatim
/// in the database form (`source_generated`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub model: String,
    pub version: String,
}

impl GeneratorInfo {
    pub fn new(model: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            version: version.into(),
        }
    }
}

/// Sentence negation, `negate(text) -> text`.
///
/// Implementations must be deterministic for output to be reproducible.
pub trait Negator: Send + Sync {
    fn negate(&self, text: &str) -> Result<String, NegationError>;

    fn generator(&self) -> GeneratorInfo;
}

/// Plain functions and closures negate with an anonymous generator id.
impl<F> Negator for F
where
    F: Fn(&str) -> Result<String, NegationError> + Send + Sync,
{
    fn negate(&self, text: &str) -> Result<String, NegationError> {
        self(text)
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new("custom", "0")
    }
}

// ============================================================================
// Rule-based negation
// ============================================================================

const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "am", "can", "could", "will", "would", "shall", "should", "may",
    "might", "must", "does", "do", "did",
];

const PERFECT_AUXILIARIES: &[&str] = &["has", "have", "had"];

const NEGATION_PREFIX: &str = "It is not the case that";

const IRREGULAR_CONTRACTIONS: &[(&str, &str)] = &[
    ("won't", "will"),
    ("can't", "can"),
    ("shan't", "shall"),
    ("ain't", "is"),
];

/// English negation by auxiliary-verb rules.
///
/// 1. A negated auxiliary (`isn't`, `cannot`, `is not`) loses its negation.
/// 2. Otherwise `not` goes after the first auxiliary or modal.
/// 3. Otherwise the sentence is wrapped as `It is not the case that ...`.
///
/// Total: blank text (a record with an empty claim) negates to the bare prefix.
#[derive(Debug, Clone, Default)]
pub struct RuleNegator;

impl RuleNegator {
    pub fn new() -> Self {
        Self
    }
}

impl Negator for RuleNegator {
    fn negate(&self, text: &str) -> Result<String, NegationError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Ok(NEGATION_PREFIX.to_string());
        }

        for (i, word) in words.iter().enumerate() {
            let bare = bare_word(word);
            let lower = bare.to_lowercase();

            if let Some(positive) = expand_negated(&lower) {
                let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
                out[i] = word.replacen(bare, &match_case(bare, &positive), 1);
                return Ok(out.join(" "));
            }

            let is_aux = AUXILIARIES.contains(&lower.as_str())
                || (PERFECT_AUXILIARIES.contains(&lower.as_str())
                    && words.get(i + 1).is_some_and(|next| is_participle(next)));
            if !is_aux {
                continue;
            }

            let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            match words.get(i + 1) {
                Some(next) if bare_word(next).eq_ignore_ascii_case("not") => {
                    // Keep trailing punctuation attached to "not" (`is not.`).
                    let tail = &next[bare_word(next).len()..];
                    out.remove(i + 1);
                    out[i].push_str(tail);
                }
                _ => {
                    // Punctuation glued to the auxiliary moves after "not".
                    let tail = word[bare.len()..].to_string();
                    out[i] = bare.to_string();
                    out.insert(i + 1, format!("not{tail}"));
                }
            }
            return Ok(out.join(" "));
        }

        Ok(format!("{NEGATION_PREFIX} {}", lowercase_sentence(&words)))
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new("rule-negator", env!("CARGO_PKG_VERSION"))
    }
}

/// The word without trailing punctuation (apostrophes stay). Words that start
/// with punctuation yield `""` and are never rewritten.
fn bare_word(word: &str) -> &str {
    if !word.starts_with(char::is_alphanumeric) {
        return "";
    }
    let end = word
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric() || *c == '\'')
        .map_or(0, |(i, c)| i + c.len_utf8());
    &word[..end]
}

fn expand_negated(lower: &str) -> Option<String> {
    if let Some((_, positive)) = IRREGULAR_CONTRACTIONS.iter().find(|(neg, _)| *neg == lower) {
        return Some(positive.to_string());
    }
    if lower == "cannot" {
        return Some("can".to_string());
    }
    let stem = lower.strip_suffix("n't")?;
    (AUXILIARIES.contains(&stem) || PERFECT_AUXILIARIES.contains(&stem)).then(|| stem.to_string())
}

fn is_participle(word: &str) -> bool {
    let lower = bare_word(word).to_lowercase();
    lower == "been" || lower.ends_with("ed") || lower.ends_with("en")
}

fn match_case(original: &str, replacement: &str) -> String {
    match original.chars().next() {
        Some(c) if c.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}

fn lowercase_sentence(words: &[&str]) -> String {
    let first = words[0];
    let keep_case = first == "I"
        || first.chars().skip(1).any(|c| c.is_uppercase())
        || first.chars().all(|c| !c.is_lowercase());
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    if !keep_case {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            out[0] = c.to_lowercase().chain(chars).collect();
        }
    }
    out.join(" ")
}
