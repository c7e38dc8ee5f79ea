//! Argmap CLI
//!
//! Command-line interface for:
//! - Parsing one Kialo text export into statements/arguments/premises JSON
//! - Batch parsing every discussion named by a topics file (or a directory)
//! - Mapping parsed JSON to the dense-integer database form
//! - Rendering a discussion's claim tree (DOT / PDF / JSON)

use anyhow::{anyhow, Context, Result};
use argmap_kialo::batch::{plan_from_directory, plan_from_topics, run_batch};
use argmap_kialo::source::{read_topics, slug_to_url};
use argmap_kialo::{
    parse_document, BatchOptions, GeneratorInfo, Negator, ParsedDocument, RuleNegator,
    SourceName, SourceTable,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "negate-ollama")]
mod llm;
mod logging;
mod viz;

#[derive(Parser)]
#[command(name = "argmap")]
#[command(
    author,
    version,
    about = "Argmap: Kialo debate exports to argument-mining records"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    negation: NegationArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct NegationArgs {
    /// Backend that writes counter-statements.
    #[arg(long, value_enum, default_value_t = NegatorKind::Rule, env = "ARGMAP_NEGATOR", global = true)]
    negator: NegatorKind,

    /// Ollama server (host:port or URL).
    #[arg(long, env = "OLLAMA_HOST", default_value = "", global = true)]
    ollama_host: String,

    /// Ollama model name.
    #[arg(long, env = "ARGMAP_OLLAMA_MODEL", default_value = "llama3.1", global = true)]
    ollama_model: String,

    /// Per-request timeout for the Ollama backend.
    #[arg(long, default_value_t = 120, global = true)]
    timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum NegatorKind {
    /// Deterministic English rules (offline).
    Rule,
    /// Local Ollama model.
    Ollama,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one export into `<slug>.json`.
    Parse {
        /// Kialo text export.
        input: PathBuf,
        /// Output JSON (default: input with `.json` extension).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Ordinal for the `kialo-<n>` source name.
        #[arg(long, default_value_t = 1)]
        ordinal: usize,
        /// Discussion URL (default: derived from the file name).
        #[arg(long)]
        url: Option<String>,
        /// Also write the database form here.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Parse many exports (topics file or whole directory).
    Batch {
        /// File with one Kialo URL per line. Without it every `*.txt` under
        /// `--discussions` is parsed.
        #[arg(long)]
        topics: Option<PathBuf>,
        /// Directory holding `<slug>.txt` exports.
        #[arg(long, default_value = "discussions")]
        discussions: PathBuf,
        /// Output directory.
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
        /// Also write `<slug>.db.json` per document.
        #[arg(long)]
        db: bool,
        /// Worker threads (default: one per core).
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Map a parsed JSON document to the database form.
    Db {
        /// Parsed document (`argmap parse` output).
        input: PathBuf,
        /// Output JSON.
        #[arg(short, long)]
        out: PathBuf,
        /// Source name → URL table (JSON object). Default: the document's own sources.
        #[arg(long)]
        sources: Option<PathBuf>,
        /// Model recorded for generated statements. Default: the negator
        /// stored in the document.
        #[arg(long)]
        model: Option<String>,
        /// Version recorded with `--model`.
        #[arg(long, requires = "model", default_value = "")]
        model_version: String,
    },

    /// Render the claim tree of one export.
    Viz {
        /// Kialo text export.
        input: PathBuf,
        /// Output format: dot|pdf|json.
        #[arg(long, default_value = "dot")]
        format: String,
        /// Output file (default: stdout for dot/json; required for pdf).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Parse {
            input,
            out,
            ordinal,
            url,
            db,
        } => {
            let negator = build_negator(&cli.negation)?;
            cmd_parse(&input, out, ordinal, url, db.as_ref(), negator.as_ref())
        }
        Commands::Batch {
            topics,
            discussions,
            out,
            db,
            jobs,
        } => {
            let negator = build_negator(&cli.negation)?;
            let opts = BatchOptions {
                discussions_dir: discussions,
                output_dir: out,
                write_database: db,
                jobs,
            };
            cmd_batch(topics.as_ref(), &opts, negator.as_ref())
        }
        Commands::Db {
            input,
            out,
            sources,
            model,
            model_version,
        } => {
            let generator = model.map(|model| GeneratorInfo::new(model, model_version));
            cmd_db(&input, &out, sources.as_ref(), generator)
        }
        Commands::Viz { input, format, out } => cmd_viz(&input, &format, out.as_ref()),
    }
}

fn build_negator(args: &NegationArgs) -> Result<Box<dyn Negator>> {
    match args.negator {
        NegatorKind::Rule => Ok(Box::new(RuleNegator::new())),
        NegatorKind::Ollama => build_ollama(args),
    }
}

#[cfg(feature = "negate-ollama")]
fn build_ollama(args: &NegationArgs) -> Result<Box<dyn Negator>> {
    let timeout = (args.timeout_secs > 0).then(|| std::time::Duration::from_secs(args.timeout_secs));
    let negator = llm::OllamaNegator::new(&args.ollama_host, &args.ollama_model, timeout)?;
    tracing::debug!(host = %llm::normalize_ollama_host(&args.ollama_host), model = %args.ollama_model, "using ollama negator");
    Ok(Box::new(negator))
}

#[cfg(not(feature = "negate-ollama"))]
fn build_ollama(_args: &NegationArgs) -> Result<Box<dyn Negator>> {
    Err(anyhow!(
        "the ollama negator is not compiled in (rebuild with `--features negate-ollama`)"
    ))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn read_export(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_parse(
    input: &Path,
    out: Option<PathBuf>,
    ordinal: usize,
    url: Option<String>,
    db: Option<&PathBuf>,
    negator: &dyn Negator,
) -> Result<()> {
    println!("{} export {}", "Parsing".green().bold(), input.display());

    let text = read_export(input)?;
    let url = url.unwrap_or_else(|| slug_to_url(&file_stem(input)));
    let source = SourceName::kialo(ordinal);
    let parsed = parse_document(&text, source, &url, negator)?;
    let doc = &parsed.document;

    let out = out.unwrap_or_else(|| input.with_extension("json"));
    fs::write(&out, doc.to_json_pretty()?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("  {} {}", "→".cyan(), out.display());
    println!(
        "  {} {} statements, {} arguments, {} premises",
        "→".yellow(),
        doc.statements.len(),
        doc.arguments.len(),
        doc.premises.len()
    );

    if let Some(db) = db {
        let records = doc.to_database(&doc.source_table(), &negator.generator())?;
        fs::write(db, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("writing {}", db.display()))?;
        println!("  {} {}", "→".cyan(), db.display());
    }

    Ok(())
}

fn cmd_batch(topics: Option<&PathBuf>, opts: &BatchOptions, negator: &dyn Negator) -> Result<()> {
    let plan = match topics {
        Some(topics) => {
            let content = fs::read_to_string(topics)
                .with_context(|| format!("reading topics file {}", topics.display()))?;
            let urls = read_topics(&content);
            println!(
                "{} {} topics from {}",
                "Batch".green().bold(),
                urls.len(),
                topics.display()
            );
            plan_from_topics(&urls, opts)
        }
        None => {
            println!(
                "{} exports under {}",
                "Batch".green().bold(),
                opts.discussions_dir.display()
            );
            plan_from_directory(opts)?
        }
    };

    let report = run_batch(&plan, opts, negator)?;

    for path in &report.missing {
        println!("  {} missing {}", "!".yellow(), path.display());
    }
    for path in &report.written {
        println!("  {} {}", "→".cyan(), path.display());
    }
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.input.display(),
            failure.error
        );
    }
    println!(
        "  {} {} parsed, {} missing, {} failed",
        "→".yellow(),
        plan.documents.len() - report.failed.len(),
        report.missing.len(),
        report.failed.len()
    );

    if !report.is_success() {
        return Err(anyhow!("{} document(s) failed", report.failed.len()));
    }
    Ok(())
}

fn cmd_db(
    input: &Path,
    out: &Path,
    sources: Option<&PathBuf>,
    generator: Option<GeneratorInfo>,
) -> Result<()> {
    println!("{} {}", "Mapping".green().bold(), input.display());

    let text = read_export(input)?;
    let doc: ParsedDocument = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a parsed document", input.display()))?;

    let table = match sources {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading source table {}", path.display()))?;
            serde_json::from_str::<SourceTable>(&raw)
                .with_context(|| format!("{} is not a source table", path.display()))?
        }
        None => doc.source_table(),
    };

    let generator = generator.or_else(|| doc.generator.clone()).ok_or_else(|| {
        anyhow!(
            "{} does not record its negator; pass `--model` (and `--model-version`)",
            input.display()
        )
    })?;

    let records = doc.to_database(&table, &generator)?;
    fs::write(out, serde_json::to_string_pretty(&records)?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("  {} {}", "→".cyan(), out.display());
    println!(
        "  {} {} statements, {} acp rows",
        "→".yellow(),
        records.statements.len(),
        records.acp.len()
    );
    Ok(())
}

fn cmd_viz(input: &Path, format: &str, out: Option<&PathBuf>) -> Result<()> {
    let format = viz::VizFormat::parse(format)?;
    let text = read_export(input)?;
    // Generated statements are not drawn, so the offline negator is enough.
    let parsed = parse_document(
        &text,
        SourceName::kialo(1),
        &slug_to_url(&file_stem(input)),
        &RuleNegator::new(),
    )?;
    let view = viz::build_tree(&parsed.document.statements, &parsed.label_map);

    let rendered = match format {
        viz::VizFormat::Dot => viz::render_dot(&view),
        viz::VizFormat::Json => viz::render_json(&view)?,
        viz::VizFormat::Pdf => {
            let out = out.ok_or_else(|| anyhow!("`--format pdf` needs `--out`"))?;
            viz::render_pdf(&viz::render_dot(&view), out)?;
            eprintln!("  {} {}", "→".cyan(), out.display());
            return Ok(());
        }
    };

    match out {
        Some(out) => {
            fs::write(out, rendered).with_context(|| format!("writing {}", out.display()))?;
            eprintln!("  {} {}", "→".cyan(), out.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
