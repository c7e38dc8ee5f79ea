use argmap_kialo::{
    parse_lines, ArgumentId, GeneratorInfo, Label, NegationError, Negator, SourceName, SourceTable,
    StatementId, Tag,
};

/// Deterministic stand-in for the negation service.
struct Prefix;

impl Negator for Prefix {
    fn negate(&self, text: &str) -> Result<String, NegationError> {
        Ok(format!("NOT {text}"))
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new("prefix", "1")
    }
}

const CLIMATE: &[&str] = &[
    "x",
    "Climate Topic",
    "",
    "1.",
    "",
    "Thesis: Climate change is real.",
    "1.1.",
    "",
    "Pro: Evidence is overwhelming.",
];

#[test]
fn climate_example_produces_expected_records() {
    let parsed = parse_lines(CLIMATE, SourceName::kialo(1), "https://www.kialo.com/c", &Prefix)
        .expect("parse");

    assert_eq!(parsed.topic, "Climate Topic");

    let ids: Vec<String> = parsed
        .document
        .statements
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["st-1", "st-1-gen", "st-2", "st-2-gen"]);

    let st1 = &parsed.document.statements[0];
    assert_eq!(st1.text, "Climate change is real.");
    assert_eq!(st1.source.as_str(), "kialo-1");
    assert_eq!(st1.tag, Tag::Retrieved);
    let st1_gen = &parsed.document.statements[1];
    assert_eq!(st1_gen.text, "NOT Climate change is real.");
    assert_eq!(st1_gen.tag, Tag::Generated);
    assert_eq!(parsed.document.statements[2].text, "Evidence is overwhelming.");

    assert_eq!(
        parsed.label_map.get(&Label::from("1")),
        Some(StatementId::original(1))
    );
    assert_eq!(
        parsed.label_map.get(&Label::from("1.1")),
        Some(StatementId::original(2))
    );
    assert_eq!(parsed.label_map.len(), 2);

    assert_eq!(parsed.document.arguments.len(), 1);
    let arg = &parsed.document.arguments[0];
    assert_eq!(arg.id, ArgumentId::new(1));
    assert_eq!(arg.claim, StatementId::original(1));
    assert_eq!(arg.source.as_str(), "kialo-1");

    assert_eq!(parsed.document.premises.len(), 1);
    assert_eq!(parsed.document.premises[0].argument, ArgumentId::new(1));
    assert_eq!(parsed.document.premises[0].premise, StatementId::original(2));
}

#[test]
fn malformed_record_yields_no_statements() {
    let lines = ["x", "Topic", "1.1.", "", "Evidence without a claim keyword."];
    let parsed = parse_lines(&lines, SourceName::kialo(1), "", &Prefix).expect("parse");
    assert!(parsed.document.statements.is_empty());
    assert!(parsed.document.arguments.is_empty());
    assert!(parsed.label_map.is_empty());
    assert_eq!(parsed.document.sources.len(), 1);
}

#[test]
fn orphans_do_not_produce_premises() {
    let lines = [
        "", "T", "1.", "", "Thesis: Root.", "1.1.", "", "Pro: Child.", "1.1.1.", "",
        "broken line", "1.1.1.1.", "", "Con: Grandchild of a broken record.",
    ];
    let parsed = parse_lines(&lines, SourceName::kialo(1), "", &Prefix).expect("parse");

    let labels: Vec<&str> = parsed.label_map.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["1", "1.1", "1.1.1.1"]);

    // "1.1.1" never parsed, so "1.1.1.1" is an orphan.
    assert_eq!(parsed.document.arguments.len(), 1);
    assert_eq!(parsed.document.premises.len(), 1);
    assert_eq!(parsed.document.premises[0].premise, StatementId::original(2));
}

#[test]
fn parsing_twice_gives_byte_identical_json() {
    let a = parse_lines(CLIMATE, SourceName::kialo(1), "u", &Prefix).unwrap();
    let b = parse_lines(CLIMATE, SourceName::kialo(1), "u", &Prefix).unwrap();
    assert_eq!(
        a.document.to_json_pretty().unwrap(),
        b.document.to_json_pretty().unwrap()
    );
}

#[test]
fn database_form_of_climate_example() {
    let parsed = parse_lines(CLIMATE, SourceName::kialo(1), "https://www.kialo.com/c", &Prefix)
        .unwrap();
    let mut sources = SourceTable::new();
    sources.insert(SourceName::kialo(1), "https://www.kialo.com/c");

    let db = parsed
        .document
        .to_database(&sources, &Prefix.generator())
        .unwrap();

    assert_eq!(db.statements.len(), 4);
    assert_eq!(db.source_retrieval.len(), 2);
    assert_eq!(db.source_generated.len(), 2);
    assert!(db
        .source_generated
        .iter()
        .all(|g| g.model == "prefix" && g.version == "1"));
    assert_eq!(db.counter_statements.len(), 2);
    assert_eq!(db.counter_statements[1].statement_id, 3);
    assert_eq!(db.counter_statements[1].counterstatement_id, 4);
    assert_eq!(db.acp.len(), 1);
    assert_eq!(db.acp[0].argument_id, 1);
    assert_eq!(db.acp[0].claim_id, 1);
    assert_eq!(db.acp[0].premise_id, 3);
}

#[test]
fn crlf_exports_parse_like_lf_exports() {
    let lf = CLIMATE.join("\n");
    let crlf = CLIMATE.join("\r\n");
    let a = argmap_kialo::parse_document(&lf, SourceName::kialo(1), "u", &Prefix).unwrap();
    let b = argmap_kialo::parse_document(&crlf, SourceName::kialo(1), "u", &Prefix).unwrap();
    assert_eq!(a.document, b.document);
}
