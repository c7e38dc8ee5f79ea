//! Statement extraction: flat export lines → statements + label map.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

use crate::error::{KialoError, NegationError, Result};
use crate::ids::{ArgumentId, Label, SourceName, StatementId};
use crate::label::parse_record;
use crate::negation::Negator;

/// Line index (0-based) holding the discussion topic in every export.
pub const TOPIC_LINE: usize = 1;

// ============================================================================
// Records
// ============================================================================

/// Provenance of a statement: read from the export, or produced by negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "")]
    Retrieved,
    #[serde(rename = "generated")]
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub text: String,
    pub tag: Tag,
    pub counter_to: StatementId,
    pub source: SourceName,
}

impl Statement {
    pub fn is_generated(&self) -> bool {
        self.tag == Tag::Generated
    }
}

// ============================================================================
// Label map
// ============================================================================

/// Label → statement id, iterated in first-insertion order.
///
/// Inserting a label that is already present replaces its id but keeps its
/// original position, so grouping in the argument builder stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<(Label, StatementId)>,
    index: HashMap<Label, usize>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id previously stored under `label`, if any.
    pub fn insert(&mut self, label: Label, id: StatementId) -> Option<StatementId> {
        match self.index.get(&label) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, id)),
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, id));
                None
            }
        }
    }

    pub fn get(&self, label: &Label) -> Option<StatementId> {
        self.index.get(label).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.index.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, StatementId)> + '_ {
        self.entries.iter().map(|(label, id)| (label, *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Label, StatementId)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (Label, StatementId)>>(iter: T) -> Self {
        let mut map = LabelMap::new();
        for (label, id) in iter {
            map.insert(label, id);
        }
        map
    }
}

impl Serialize for LabelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, id) in &self.entries {
            map.serialize_entry(label, id)?;
        }
        map.end()
    }
}

// ============================================================================
// Parse-run state
// ============================================================================

/// Counters for one document. Every id sequence restarts per document, so
/// documents can be parsed independently (and in parallel).
#[derive(Debug, Clone)]
pub struct ParseRun {
    source: SourceName,
    statements: u64,
    arguments: u64,
}

impl ParseRun {
    pub fn new(source: SourceName) -> Self {
        Self {
            source,
            statements: 0,
            arguments: 0,
        }
    }

    pub fn source(&self) -> &SourceName {
        &self.source
    }

    pub(crate) fn next_statement_seq(&mut self) -> u64 {
        self.statements += 1;
        self.statements
    }

    pub(crate) fn next_argument_id(&mut self) -> ArgumentId {
        self.arguments += 1;
        ArgumentId::new(self.arguments)
    }
}

// ============================================================================
// Extraction
// ============================================================================

#[derive(Debug, Clone)]
pub struct Extraction {
    pub topic: String,
    pub statements: Vec<Statement>,
    pub label_map: LabelMap,
}

/// Scan `lines` for three-line records.
///
/// The cursor moves by 3 after a record and by 1 otherwise; which malformed
/// records get dropped (versus shifting later records out of alignment)
/// depends on exactly this stepping.
pub fn extract_statements<L: AsRef<str>>(
    lines: &[L],
    run: &mut ParseRun,
    negator: &dyn Negator,
) -> Result<Extraction> {
    let topic = lines
        .get(TOPIC_LINE)
        .map(|line| line.as_ref().trim().to_string())
        .ok_or(KialoError::MissingTopic {
            line_count: lines.len(),
        })?;

    let mut statements = Vec::new();
    let mut label_map = LabelMap::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        let Some(record) = parse_record(
            lines[i].as_ref(),
            lines[i + 1].as_ref(),
            lines[i + 2].as_ref(),
        ) else {
            tracing::trace!(line = i + 1, "no record");
            i += 1;
            continue;
        };

        let seq = run.next_statement_seq();
        let st_id = StatementId::original(seq);
        let gen_id = StatementId::generated(seq);

        if let Some(previous) = label_map.insert(record.label.clone(), st_id) {
            tracing::warn!(
                label = %record.label,
                %previous,
                replacement = %st_id,
                "duplicate label; later record wins"
            );
        }

        let negation = negator
            .negate(&record.text)
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(NegationError::Empty)
                } else {
                    Ok(text)
                }
            })
            .map_err(|source| KialoError::Negation {
                statement: st_id,
                source,
            })?;

        statements.push(Statement {
            id: st_id,
            text: record.text,
            tag: Tag::Retrieved,
            counter_to: gen_id,
            source: run.source().clone(),
        });
        statements.push(Statement {
            id: gen_id,
            text: negation,
            tag: Tag::Generated,
            counter_to: st_id,
            source: run.source().clone(),
        });

        i += 3;
    }

    tracing::debug!(
        source = %run.source(),
        statements = statements.len(),
        labels = label_map.len(),
        "extracted statements"
    );

    Ok(Extraction {
        topic,
        statements,
        label_map,
    })
}
