//! Identifiers used across one parse run.
//!
//! Statement and argument ids are allocated from the per-document
//! [`ParseRun`](crate::ParseRun) counters and serialize as their string forms
//! (`st-3`, `st-3-gen`, `arg-1`), which is what downstream consumers key on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::KialoError;

// ============================================================================
// Statement ids
// ============================================================================

/// `st-<n>` for a statement read from the export, `st-<n>-gen` for its
/// generated counter-statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StatementId {
    seq: u64,
    generated: bool,
}

impl StatementId {
    pub fn original(seq: u64) -> Self {
        Self {
            seq,
            generated: false,
        }
    }

    pub fn generated(seq: u64) -> Self {
        Self {
            seq,
            generated: true,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// The other half of an original/generated pair.
    pub fn counterpart(&self) -> Self {
        Self {
            seq: self.seq,
            generated: !self.generated,
        }
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generated {
            write!(f, "st-{}-gen", self.seq)
        } else {
            write!(f, "st-{}", self.seq)
        }
    }
}

impl std::str::FromStr for StatementId {
    type Err = KialoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KialoError::InvalidId {
            kind: "statement",
            value: s.to_string(),
        };
        let rest = s.strip_prefix("st-").ok_or_else(invalid)?;
        let (digits, generated) = match rest.strip_suffix("-gen") {
            Some(digits) => (digits, true),
            None => (rest, false),
        };
        let seq = digits.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { seq, generated })
    }
}

impl From<StatementId> for String {
    fn from(id: StatementId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for StatementId {
    type Error = KialoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Argument ids
// ============================================================================

/// `arg-<k>`; the database form stores the bare `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ArgumentId(u64);

impl ArgumentId {
    pub fn new(k: u64) -> Self {
        Self(k)
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArgumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arg-{}", self.0)
    }
}

impl std::str::FromStr for ArgumentId {
    type Err = KialoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("arg-")
            .and_then(|k| k.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| KialoError::InvalidId {
                kind: "argument",
                value: s.to_string(),
            })
    }
}

impl From<ArgumentId> for String {
    fn from(id: ArgumentId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ArgumentId {
    type Error = KialoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Dotted numeric position of a claim in the debate tree (`"1.2.3"`).
///
/// Trailing dots are already stripped. The empty label is the root position
/// some exports use for the thesis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last dot, or `None` for a top-level label.
    pub fn parent(&self) -> Option<Label> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Label(parent.to_string()))
    }

    pub fn depth(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.matches('.').count() + 1
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Source names
// ============================================================================

/// Name of one input document within a batch, `kialo-<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceName(String);

impl SourceName {
    pub fn kialo(ordinal: usize) -> Self {
        Self(format!("kialo-{ordinal}"))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
