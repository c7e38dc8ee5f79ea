//! Batch processing of many exports.
//!
//! Planning is sequential: it decides which files exist and hands out the
//! `kialo-<n>` ordinals. Processing is per document and may run in parallel;
//! documents share nothing but the read-only source table and negator.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{KialoError, Result};
use crate::ids::SourceName;
use crate::negation::Negator;
use crate::source::{slug_to_url, url_slug, url_to_filenames, SourceTable};
use crate::{parse_document, ParsedDocument};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory holding `<slug>.txt` exports.
    pub discussions_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Also write `<slug>.db.json` with the database form.
    pub write_database: bool,
    /// Worker threads; `None` uses rayon's default, `Some(1)` runs inline.
    pub jobs: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            discussions_dir: PathBuf::from("discussions"),
            output_dir: PathBuf::from("output"),
            write_database: false,
            jobs: None,
        }
    }
}

/// One export scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDocument {
    pub source: SourceName,
    pub url: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub db_output: PathBuf,
}

#[derive(Debug, Default)]
pub struct BatchPlan {
    pub documents: Vec<PlannedDocument>,
    /// Inputs named by the topics file that do not exist on disk.
    pub missing: Vec<PathBuf>,
}

impl BatchPlan {
    pub fn source_table(&self) -> SourceTable {
        self.documents
            .iter()
            .map(|d| (d.source.clone(), d.url.clone()))
            .collect()
    }
}

#[derive(Debug)]
pub struct DocumentFailure {
    pub input: PathBuf,
    pub error: KialoError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

fn planned(ordinal: usize, url: String, input: PathBuf, opts: &BatchOptions) -> PlannedDocument {
    let (_, json_name) = url_to_filenames(&url);
    let slug = url_slug(&url);
    PlannedDocument {
        source: SourceName::kialo(ordinal),
        output: opts.output_dir.join(json_name),
        db_output: opts.output_dir.join(format!("{slug}.db.json")),
        url,
        input,
    }
}

/// Plan from topics-file URLs. Missing exports are skipped without consuming
/// an ordinal, so `kialo-<n>` numbers only the documents actually processed.
pub fn plan_from_topics(urls: &[String], opts: &BatchOptions) -> BatchPlan {
    let mut plan = BatchPlan::default();
    for url in urls {
        let (txt_name, _) = url_to_filenames(url);
        let input = opts.discussions_dir.join(txt_name);
        if !input.is_file() {
            tracing::warn!(path = %input.display(), "missing export; skipping");
            plan.missing.push(input);
            continue;
        }
        let ordinal = plan.documents.len() + 1;
        plan.documents.push(planned(ordinal, url.clone(), input, opts));
    }
    plan
}

/// Plan every `*.txt` under `opts.discussions_dir`, in path order.
pub fn plan_from_directory(opts: &BatchOptions) -> Result<BatchPlan> {
    let mut inputs = Vec::new();
    for entry in WalkDir::new(&opts.discussions_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| KialoError::Io {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| opts.discussions_dir.clone()),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            inputs.push(path.to_path_buf());
        }
    }

    let documents = inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            planned(i + 1, slug_to_url(&stem), input, opts)
        })
        .collect();

    Ok(BatchPlan {
        documents,
        missing: Vec::new(),
    })
}

/// Read, parse, and serialize one planned document.
pub fn process_document(doc: &PlannedDocument, negator: &dyn Negator) -> Result<ParsedDocument> {
    let text = fs::read_to_string(&doc.input).map_err(|source| KialoError::Io {
        path: doc.input.clone(),
        source,
    })?;
    let parsed = parse_document(&text, doc.source.clone(), &doc.url, negator)?;
    Ok(parsed.document)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| KialoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run_one(
    doc: &PlannedDocument,
    opts: &BatchOptions,
    sources: &SourceTable,
    negator: &dyn Negator,
) -> Result<Vec<PathBuf>> {
    tracing::info!(
        input = %doc.input.display(),
        output = %doc.output.display(),
        source = %doc.source,
        "processing"
    );
    let document = process_document(doc, negator)?;

    // Serialize everything before touching disk so a mapping failure leaves
    // no partial output for this document.
    let json = document.to_json_pretty()?;
    let db_json = if opts.write_database {
        let records = document.to_database(sources, &negator.generator())?;
        Some(serde_json::to_string_pretty(&records)?)
    } else {
        None
    };

    write_file(&doc.output, &json)?;
    let mut written = vec![doc.output.clone()];
    if let Some(db_json) = db_json {
        write_file(&doc.db_output, &db_json)?;
        written.push(doc.db_output.clone());
    }
    Ok(written)
}

/// Process a plan. Per-document failures are collected, never fatal to the
/// rest of the batch.
pub fn run_batch(
    plan: &BatchPlan,
    opts: &BatchOptions,
    negator: &dyn Negator,
) -> Result<BatchReport> {
    fs::create_dir_all(&opts.output_dir).map_err(|source| KialoError::Io {
        path: opts.output_dir.clone(),
        source,
    })?;

    let sources = plan.source_table();
    let work = |doc: &PlannedDocument| run_one(doc, opts, &sources, negator);

    let results: Vec<Result<Vec<PathBuf>>> = match opts.jobs {
        Some(1) => plan.documents.iter().map(work).collect(),
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| plan.documents.par_iter().map(work).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "could not build thread pool; using the global one");
                plan.documents.par_iter().map(work).collect()
            }
        },
        None => plan.documents.par_iter().map(work).collect(),
    };

    let mut report = BatchReport {
        missing: plan.missing.clone(),
        ..BatchReport::default()
    };
    for (doc, result) in plan.documents.iter().zip(results) {
        match result {
            Ok(paths) => report.written.extend(paths),
            Err(error) => {
                tracing::error!(input = %doc.input.display(), %error, "document failed");
                report.failed.push(DocumentFailure {
                    input: doc.input.clone(),
                    error,
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_plan_skips_missing_without_consuming_ordinals() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b-2.txt"), "x\nTopic\n").unwrap();
        let opts = BatchOptions {
            discussions_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            ..BatchOptions::default()
        };
        let urls = vec![
            "https://www.kialo.com/a-1".to_string(),
            "https://www.kialo.com/b-2".to_string(),
        ];

        let plan = plan_from_topics(&urls, &opts);
        assert_eq!(plan.missing, vec![dir.path().join("a-1.txt")]);
        assert_eq!(plan.documents.len(), 1);
        assert_eq!(plan.documents[0].source.as_str(), "kialo-1");
        assert_eq!(plan.documents[0].output, dir.path().join("out").join("b-2.json"));
        assert_eq!(plan.documents[0].db_output, dir.path().join("out").join("b-2.db.json"));
    }

    #[test]
    fn directory_plan_is_sorted_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zeta-9.txt"), "").unwrap();
        fs::write(dir.path().join("alpha-1.txt"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        let opts = BatchOptions {
            discussions_dir: dir.path().to_path_buf(),
            ..BatchOptions::default()
        };

        let plan = plan_from_directory(&opts).unwrap();
        let urls: Vec<&str> = plan.documents.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.kialo.com/alpha-1", "https://www.kialo.com/zeta-9"]
        );
        assert_eq!(plan.documents[1].source.as_str(), "kialo-2");
    }
}
