//! Ontotag CLI
//!
//! Command-line interface for:
//! - Tagging free text against an ontology snapshot (`tag`)
//! - Inspecting synonym canonicalization (`canonicalize`)
//! - Querying the entity taxonomy (`lookup`)
//! - Classifying entities into schema dimensions (`classify`)
//! - Running the spelling corrector (`correct`)
//!
//! The ontology is read from a JSON snapshot of the pre-parsed source tables.
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ontotag_engine::{TagOrchestrator, TaggerConfig};
use ontotag_ontology::{OntologyIndex, OntologySource};

mod output;

use output::{print_json, print_list, print_results, print_runs, OutputFormat};

#[derive(Parser)]
#[command(name = "ontotag")]
#[command(author, version, about = "Ontotag: rule-based ontology tagging")]
struct Cli {
    /// Ontology snapshot (JSON source tables)
    #[arg(short, long, global = true, env = "ONTOTAG_ONTOLOGY")]
    ontology: Option<PathBuf>,

    /// Tagger configuration (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag text. Reads arguments, `--input` lines, or stdin lines.
    Tag {
        /// Texts to tag (one document each)
        texts: Vec<String>,
        /// File with one document per line
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Include match type and subtype for every tag
        #[arg(long)]
        detailed: bool,
    },

    /// Show the canonicalized form of a text
    Canonicalize {
        text: String,
        /// Also report how many passes ran and whether they converged
        #[arg(long)]
        trace: bool,
    },

    /// Entity and relationship queries
    Lookup {
        #[command(subcommand)]
        command: LookupCommands,
        #[arg(short, long, value_enum, default_value = "table", global = true)]
        format: OutputFormat,
    },

    /// Classify entities into the dimensions of a schema
    Classify {
        /// Schema name (as loaded from the snapshot)
        #[arg(short, long)]
        schema: String,
        entities: Vec<String>,
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Spell-correct words against the ontology vocabulary
    Correct { words: Vec<String> },
}

#[derive(Subcommand)]
enum LookupCommands {
    /// Canonical label of a term
    Label { term: String },
    /// Direct parents
    Parents { term: String },
    /// Transitive parents
    Ancestors { term: String },
    /// Direct children
    Children { term: String },
    /// Transitive children
    Descendants { term: String },
    /// Related terms
    SeeAlso { term: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ontology = cli
        .ontology
        .as_deref()
        .context("no ontology snapshot given (use --ontology or ONTOTAG_ONTOLOGY)")?;
    let index = Arc::new(load_index(ontology)?);

    match cli.command {
        Commands::Tag {
            texts,
            input,
            format,
            detailed,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_tag(index, config, texts, input.as_deref(), format, detailed)?;
        }
        Commands::Canonicalize { text, trace } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_canonicalize(index, config, &text, trace)?;
        }
        Commands::Lookup { command, format } => cmd_lookup(&index, command, format)?,
        Commands::Classify {
            schema,
            entities,
            format,
        } => cmd_classify(&index, &schema, &entities, format)?,
        Commands::Correct { words } => {
            let config = load_config(cli.config.as_deref())?;
            let tagger = TagOrchestrator::new(index, config)?;
            let speller = tagger.spelling();
            for word in &words {
                let corrected = speller.correct(&word.to_lowercase());
                if corrected == word.to_lowercase() {
                    println!("{word}");
                } else {
                    println!("{} {} {}", word, "→".cyan(), corrected.green());
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_index(path: &Path) -> Result<OntologyIndex> {
    let source = OntologySource::from_json_file(path)
        .with_context(|| format!("failed to load ontology snapshot {}", path.display()))?;
    let index = OntologyIndex::from_source(source)
        .with_context(|| format!("failed to index ontology {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        entities = index.entity_count(),
        "loaded ontology"
    );
    Ok(index)
}

fn load_config(path: Option<&Path>) -> Result<TaggerConfig> {
    match path {
        Some(path) => TaggerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(TaggerConfig::default()),
    }
}

fn read_documents(texts: Vec<String>, input: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut docs = texts;
        docs.extend(content.lines().map(str::to_string));
        return Ok(docs);
    }
    if !texts.is_empty() {
        return Ok(texts);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("no text given: pass texts as arguments, --input FILE, or pipe lines on stdin");
    }
    stdin
        .lock()
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .context("failed to read stdin")
}

fn cmd_tag(
    index: Arc<OntologyIndex>,
    config: TaggerConfig,
    texts: Vec<String>,
    input: Option<&Path>,
    format: OutputFormat,
    detailed: bool,
) -> Result<()> {
    let docs = read_documents(texts, input)?;
    let tagger = TagOrchestrator::new(index, config)?;

    if detailed {
        let runs: Vec<_> = docs.iter().map(|d| tagger.process_tags(d)).collect();
        return print_runs(&runs, format);
    }
    let results = if docs.len() == 1 {
        vec![tagger.process(&docs[0])]
    } else {
        tagger.process_batch(&docs)
    };
    print_results(&results, format)
}

fn cmd_canonicalize(
    index: Arc<OntologyIndex>,
    config: TaggerConfig,
    text: &str,
    trace: bool,
) -> Result<()> {
    let tagger = TagOrchestrator::new(index, config)?;
    if !trace {
        println!("{}", tagger.canonicalize(text));
        return Ok(());
    }
    let out = tagger.canonicalize_traced(text);
    println!("{}", out.text);
    let status = if out.converged {
        "converged".green()
    } else {
        "iteration limit".yellow()
    };
    eprintln!("{} after {} pass(es)", status, out.passes);
    Ok(())
}

fn cmd_lookup(index: &OntologyIndex, command: LookupCommands, format: OutputFormat) -> Result<()> {
    let lookup = index.lookup();
    match command {
        LookupCommands::Label { term } => match lookup.label(&term) {
            Some(label) => print_list(&[label], format),
            None => {
                eprintln!("{} {}", "not found:".yellow().bold(), term);
                Ok(())
            }
        },
        LookupCommands::Parents { term } => print_list(&lookup.parents(&term), format),
        LookupCommands::Ancestors { term } => print_list(&lookup.ancestors(&term), format),
        LookupCommands::Children { term } => print_list(&lookup.children(&term), format),
        LookupCommands::Descendants { term } => print_list(&lookup.descendants(&term), format),
        LookupCommands::SeeAlso { term } => print_list(&lookup.see_also(&term), format),
    }
}

fn cmd_classify(
    index: &OntologyIndex,
    schema: &str,
    entities: &[String],
    format: OutputFormat,
) -> Result<()> {
    let classified = index
        .dimensions()
        .classify_all(schema, entities.iter().map(String::as_str))
        .with_context(|| format!("failed to classify under schema {schema:?}"))?;

    match format {
        OutputFormat::Json => print_json(&classified),
        OutputFormat::Table => {
            for (entity, dims) in &classified {
                println!("{}  {}", entity.bold(), dims.join(", "));
            }
            Ok(())
        }
    }
}
