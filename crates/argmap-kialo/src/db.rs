//! Database record mapping.
//!
//! Re-keys a parsed document onto dense integer ids (`1..=N`, in statement
//! order) and splits statements into the provenance tables the relational
//! store expects. Field names are the storage contract; do not rename them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::arguments::{Argument, Premise};
use crate::error::{KialoError, Result};
use crate::ids::{ArgumentId, StatementId};
use crate::negation::GeneratorInfo;
use crate::source::SourceTable;
use crate::statements::{Statement, Tag};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStatement {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbCounterStatement {
    pub statement_id: u64,
    pub counterstatement_id: u64,
}

/// One (argument, claim, premise) row; an argument with three premises yields
/// three rows sharing `argument_id` and `claim_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbAcp {
    pub argument_id: u64,
    pub claim_id: u64,
    pub premise_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSourceRetrieval {
    pub statement_id: u64,
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSourceGenerated {
    pub statement_id: u64,
    pub model: String,
    pub version: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSourceManual {
    pub statement_id: u64,
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRecords {
    pub statements: Vec<DbStatement>,
    pub counter_statements: Vec<DbCounterStatement>,
    pub acp: Vec<DbAcp>,
    /// Never populated by ingestion; present so the file mirrors the schema.
    pub source_manual: Vec<DbSourceManual>,
    pub source_generated: Vec<DbSourceGenerated>,
    pub source_retrieval: Vec<DbSourceRetrieval>,
}

/// String statement id → dense integer id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DenseIds {
    ids: HashMap<StatementId, u64>,
}

impl DenseIds {
    pub fn assign(statements: &[Statement]) -> Self {
        let mut ids = HashMap::with_capacity(statements.len());
        let mut next = 0u64;
        for st in statements {
            ids.entry(st.id).or_insert_with(|| {
                next += 1;
                next
            });
        }
        Self { ids }
    }

    pub fn get(&self, id: StatementId) -> Option<u64> {
        self.ids.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn resolve(&self, id: StatementId, referenced_by: impl FnOnce() -> String) -> Result<u64> {
        self.get(id).ok_or_else(|| KialoError::UnresolvedStatement {
            id: id.to_string(),
            referenced_by: referenced_by(),
        })
    }
}

/// Build the database form of one parsed document.
///
/// Every id was produced by the same parse run, so a failed lookup is an
/// internal-consistency error and aborts the mapping.
pub fn map_to_database(
    statements: &[Statement],
    arguments: &[Argument],
    premises: &[Premise],
    sources: &SourceTable,
    generator: &GeneratorInfo,
) -> Result<DatabaseRecords> {
    let ids = DenseIds::assign(statements);
    let mut out = DatabaseRecords::default();

    for st in statements {
        let id = ids.resolve(st.id, || format!("statement {}", st.id))?;
        out.statements.push(DbStatement {
            id,
            text: st.text.clone(),
        });

        match st.tag {
            Tag::Retrieved => {
                let url = sources.url(&st.source).unwrap_or_else(|| {
                    tracing::warn!(source = %st.source, statement = %st.id, "no url for source");
                    ""
                });
                out.source_retrieval.push(DbSourceRetrieval {
                    statement_id: id,
                    url: url.to_string(),
                    text: st.text.clone(),
                });
            }
            Tag::Generated => {
                out.source_generated.push(DbSourceGenerated {
                    statement_id: id,
                    model: generator.model.clone(),
                    version: generator.version.clone(),
                    text: st.text.clone(),
                });
                let original =
                    ids.resolve(st.counter_to, || format!("counter_to of {}", st.id))?;
                out.counter_statements.push(DbCounterStatement {
                    statement_id: original,
                    counterstatement_id: id,
                });
            }
        }
    }

    let mut premises_by_argument: HashMap<ArgumentId, Vec<&Premise>> = HashMap::new();
    for premise in premises {
        premises_by_argument
            .entry(premise.argument)
            .or_default()
            .push(premise);
    }

    for arg in arguments {
        let claim_id = ids.resolve(arg.claim, || format!("claim of {}", arg.id))?;
        for premise in premises_by_argument.remove(&arg.id).unwrap_or_default() {
            let premise_id = ids.resolve(premise.premise, || {
                format!("premise of {}", premise.argument)
            })?;
            out.acp.push(DbAcp {
                argument_id: arg.id.number(),
                claim_id,
                premise_id,
            });
        }
    }

    // Whatever is left points at an argument that was never emitted.
    if let Some(orphan) = premises
        .iter()
        .find(|p| premises_by_argument.contains_key(&p.argument))
    {
        return Err(KialoError::UnresolvedArgument {
            argument: orphan.argument.to_string(),
        });
    }

    tracing::debug!(
        statements = out.statements.len(),
        acp = out.acp.len(),
        "mapped database records"
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SourceName;

    fn pair(seq: u64, text: &str, negation: &str) -> [Statement; 2] {
        let source = SourceName::kialo(1);
        [
            Statement {
                id: StatementId::original(seq),
                text: text.to_string(),
                tag: Tag::Retrieved,
                counter_to: StatementId::generated(seq),
                source: source.clone(),
            },
            Statement {
                id: StatementId::generated(seq),
                text: negation.to_string(),
                tag: Tag::Generated,
                counter_to: StatementId::original(seq),
                source,
            },
        ]
    }

    fn fixture() -> (Vec<Statement>, Vec<Argument>, Vec<Premise>, SourceTable) {
        let statements: Vec<Statement> = pair(1, "A is B.", "A is not B.")
            .into_iter()
            .chain(pair(2, "C is D.", "C is not D."))
            .collect();
        let arguments = vec![Argument {
            id: ArgumentId::new(1),
            claim: StatementId::original(1),
            source: SourceName::kialo(1),
        }];
        let premises = vec![Premise {
            argument: ArgumentId::new(1),
            premise: StatementId::original(2),
        }];
        let mut sources = SourceTable::new();
        sources.insert(SourceName::kialo(1), "https://www.kialo.com/ab");
        (statements, arguments, premises, sources)
    }

    #[test]
    fn maps_a_small_document() {
        let (statements, arguments, premises, sources) = fixture();
        let generator = GeneratorInfo::new("rule-negator", "1");
        let db = map_to_database(&statements, &arguments, &premises, &sources, &generator).unwrap();

        let ids: Vec<u64> = db.statements.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        assert_eq!(db.source_retrieval.len(), 2);
        assert_eq!(db.source_retrieval[0].url, "https://www.kialo.com/ab");
        assert_eq!(db.source_retrieval[1].statement_id, 3);

        assert_eq!(db.source_generated.len(), 2);
        assert_eq!(db.source_generated[0].model, "rule-negator");
        assert_eq!(db.source_generated[1].text, "C is not D.");

        assert_eq!(
            db.counter_statements,
            vec![
                DbCounterStatement {
                    statement_id: 1,
                    counterstatement_id: 2
                },
                DbCounterStatement {
                    statement_id: 3,
                    counterstatement_id: 4
                },
            ]
        );
        assert_eq!(
            db.acp,
            vec![DbAcp {
                argument_id: 1,
                claim_id: 1,
                premise_id: 3
            }]
        );
        assert!(db.source_manual.is_empty());
    }

    #[test]
    fn unknown_source_gets_an_empty_url() {
        let (statements, arguments, premises, _) = fixture();
        let generator = GeneratorInfo::new("m", "v");
        let db =
            map_to_database(&statements, &arguments, &premises, &SourceTable::new(), &generator).unwrap();
        assert!(db.source_retrieval.iter().all(|r| r.url.is_empty()));
    }

    #[test]
    fn missing_premise_statement_is_fatal() {
        let (statements, arguments, mut premises, sources) = fixture();
        premises.push(Premise {
            argument: ArgumentId::new(1),
            premise: StatementId::original(9),
        });
        let generator = GeneratorInfo::new("m", "v");
        let err = map_to_database(&statements, &arguments, &premises, &sources, &generator).unwrap_err();
        match err {
            KialoError::UnresolvedStatement { id, referenced_by } => {
                assert_eq!(id, "st-9");
                assert_eq!(referenced_by, "premise of arg-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_claim_statement_is_fatal() {
        let (statements, mut arguments, premises, sources) = fixture();
        arguments[0].claim = StatementId::original(5);
        let generator = GeneratorInfo::new("m", "v");
        assert!(matches!(
            map_to_database(&statements, &arguments, &premises, &sources, &generator),
            Err(KialoError::UnresolvedStatement { .. })
        ));
    }

    #[test]
    fn premise_without_argument_is_fatal() {
        let (statements, _, premises, sources) = fixture();
        let generator = GeneratorInfo::new("m", "v");
        assert!(matches!(
            map_to_database(&statements, &[], &premises, &sources, &generator),
            Err(KialoError::UnresolvedArgument { .. })
        ));
    }

    #[test]
    fn serialized_field_names_match_the_schema() {
        let (statements, arguments, premises, sources) = fixture();
        let generator = GeneratorInfo::new("m", "v");
        let db = map_to_database(&statements, &arguments, &premises, &sources, &generator).unwrap();
        let value = serde_json::to_value(&db).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "acp",
                "counter_statements",
                "source_generated",
                "source_manual",
                "source_retrieval",
                "statements"
            ]
        );
        assert_eq!(value["acp"][0]["premise_id"], 3);
        assert_eq!(value["counter_statements"][0]["counterstatement_id"], 2);
    }
}
