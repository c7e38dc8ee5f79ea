//! Three-line record recognition.
//!
//! A Kialo plain-text export lays each claim out as
//!
//! ```text
//! 1.2.
//!
//! Pro: The actual claim text.
//! ```
//!
//! The label line, an (ideally) blank line, and the claim line are joined with
//! single spaces and matched as one string. Joining instead of checking each
//! line separately means a claim line shifted up by one still matches, with the
//! third line appended to its text; exports rely on that quirk.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::ids::Label;

/// Claim kind written before the colon on the claim line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Thesis,
    Pro,
    Con,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Thesis => "Thesis",
            ClaimType::Pro => "Pro",
            ClaimType::Con => "Con",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "Thesis" => Some(ClaimType::Thesis),
            "Pro" => Some(ClaimType::Pro),
            "Con" => Some(ClaimType::Con),
            _ => None,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    pub label: Label,
    pub claim_type: ClaimType,
    pub text: String,
}

fn record_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:\d+\.)*)\s+(Thesis|Pro|Con):\s+(.*)$").expect("static regex")
    })
}

/// Try to read a record from three consecutive lines.
///
/// Lines are trimmed here so callers can pass raw export lines. Returns
/// `None` when the triple is not a record; the caller advances by one line.
pub fn parse_record(l1: &str, l2: &str, l3: &str) -> Option<LabelRecord> {
    // The label prefix may be empty, so the first line needs no check of its
    // own; the anchored combined match does all the filtering.
    let combined = [l1.trim(), l2.trim(), l3.trim()].join(" ");
    let caps = record_re().captures(&combined)?;

    let label = caps.get(1).map_or("", |m| m.as_str()).trim_matches('.');
    let claim_type = ClaimType::from_keyword(caps.get(2)?.as_str())?;
    let text = caps.get(3).map_or("", |m| m.as_str());

    Some(LabelRecord {
        label: Label::new(label),
        claim_type,
        text: text.to_string(),
    })
}

/// Render a record in the canonical export layout: `"<label>."`, a blank line,
/// then `"<Type>: <text>"`. The root (empty) label renders as an empty line.
pub fn format_record(record: &LabelRecord) -> [String; 3] {
    let label_line = if record.label.as_str().is_empty() {
        String::new()
    } else {
        format!("{}.", record.label)
    };
    [
        label_line,
        String::new(),
        format!("{}: {}", record.claim_type, record.text),
    ]
}
