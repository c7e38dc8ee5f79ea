//! Kialo debate export ingestion for Argmap
//!
//! Turns the plain-text export of a Kialo discussion into:
//! - statements (each paired with a generated counter-statement)
//! - arguments (one per claim that has children) and their premises
//! - the source record of the discussion
//!
//! and, on request, the dense-integer database form of the same data.
//!
//! ```text
//! lines ──► label ──► statements ──┬──► arguments ──┐
//!                                  │                ├──► ParsedDocument ──► db
//!                                  └────────────────┘
//! ```
//!
//! Every stage takes the per-document [`ParseRun`] explicitly; nothing here
//! keeps global state, so documents can be processed in parallel.

use serde::{Deserialize, Serialize};

pub mod arguments;
pub mod batch;
pub mod db;
pub mod error;
pub mod ids;
pub mod label;
pub mod negation;
pub mod source;
pub mod statements;

pub use arguments::{build_arguments, Argument, ArgumentTree, Premise};
pub use batch::{BatchOptions, BatchPlan, BatchReport, DocumentFailure, PlannedDocument};
pub use db::{map_to_database, DatabaseRecords, DenseIds};
pub use error::{KialoError, NegationError, Result};
pub use ids::{ArgumentId, Label, SourceName, StatementId};
pub use label::{format_record, parse_record, ClaimType, LabelRecord};
pub use negation::{GeneratorInfo, Negator, RuleNegator};
pub use source::{Source, SourceTable};
pub use statements::{extract_statements, Extraction, LabelMap, ParseRun, Statement, Tag};

// ============================================================================
// Document output
// ============================================================================

/// The simple JSON form written per discussion. Field names are the contract
/// downstream consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub statements: Vec<Statement>,
    pub arguments: Vec<Argument>,
    pub premises: Vec<Premise>,
    pub sources: Vec<Source>,
    /// The negator that wrote the generated statements. Absent in documents
    /// written before it was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorInfo>,
}

impl ParsedDocument {
    /// Dense-integer database form, with retrieval urls from `sources`.
    pub fn to_database(
        &self,
        sources: &SourceTable,
        generator: &GeneratorInfo,
    ) -> Result<DatabaseRecords> {
        map_to_database(
            &self.statements,
            &self.arguments,
            &self.premises,
            sources,
            generator,
        )
    }

    /// The url of each of this document's sources, keyed by source name.
    pub fn source_table(&self) -> SourceTable {
        self.sources
            .iter()
            .map(|s| (s.name.clone(), s.url.clone()))
            .collect()
    }

    /// Pretty JSON with two-space indentation; non-ASCII text is kept as is.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything one parse produces. `label_map` is not part of the JSON output
/// but tree views need it.
#[derive(Debug, Clone)]
pub struct DocumentParse {
    pub document: ParsedDocument,
    pub label_map: LabelMap,
    pub topic: String,
}

/// Parse one export held in memory.
pub fn parse_document(
    text: &str,
    source: SourceName,
    url: &str,
    negator: &dyn Negator,
) -> Result<DocumentParse> {
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines, source, url, negator)
}

/// Parse an export already split into lines.
pub fn parse_lines<L: AsRef<str>>(
    lines: &[L],
    source: SourceName,
    url: &str,
    negator: &dyn Negator,
) -> Result<DocumentParse> {
    let mut run = ParseRun::new(source);

    let Extraction {
        topic,
        statements,
        label_map,
    } = extract_statements(lines, &mut run, negator)?;
    let ArgumentTree {
        arguments,
        premises,
    } = build_arguments(&label_map, &mut run);

    let source = Source::new(run.source().clone(), topic.clone(), url);

    Ok(DocumentParse {
        document: ParsedDocument {
            statements,
            arguments,
            premises,
            sources: vec![source],
            generator: Some(negator.generator()),
        },
        label_map,
        topic,
    })
}
