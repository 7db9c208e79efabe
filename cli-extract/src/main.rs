use alert_parser::{
    AcceptancePolicy, DateTimeResolver, Engine, EngineConfig, ExtractError, ParsedTransaction, RawMessage,
    validate, write_csv, write_json_lines,
};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cli_extract",
    version,
    about = "Extracts transactions from bank alert emails (mail-API JSON).",
    long_about = None,
)]
struct Args {
    /// Message files or directories of *.json files
    #[arg(long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Output file, stdout when absent
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Zone for dates that carry none (IANA name), system zone when absent
    #[arg(long)]
    tz: Option<Tz>,

    /// Require every field, and the date where the template declares one
    #[arg(long)]
    strict: bool,

    /// Drop transactions that fail validation
    #[arg(long)]
    validate: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

/// A file holds either one message or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    Many(Vec<RawMessage>),
    One(Box<RawMessage>),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ExtractError> {
    let args = Args::parse();

    let mut messages = Vec::new();
    for path in &args.input {
        for file in message_files(path)? {
            messages.extend(read_messages(&file)?);
        }
    }

    let resolver = match args.tz {
        Some(tz) => DateTimeResolver::with_zone(tz),
        None => DateTimeResolver::system(),
    };
    let acceptance = if args.strict {
        AcceptancePolicy::AllFields
    } else {
        AcceptancePolicy::AnyIdentifier
    };
    let engine = Engine::new()
        .with_resolver(resolver)
        .with_config(EngineConfig::default().with_acceptance(acceptance));

    let parsed: Vec<ParsedTransaction> = engine
        .parse_batch(&messages, args.threads)
        .into_iter()
        .flatten()
        .filter(|tx| !args.validate || is_valid(tx))
        .collect();

    info!(messages = messages.len(), transactions = parsed.len(), "extraction finished");

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    match args.format {
        Format::Json => write_json_lines(&parsed, writer),
        Format::Csv => write_csv(&parsed, writer),
    }
}

fn message_files(path: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let file = entry?.path();
        if file.extension().is_some_and(|ext| ext == "json") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

fn read_messages(path: &Path) -> Result<Vec<RawMessage>, ExtractError> {
    let file = File::open(path)?;

    Ok(match serde_json::from_reader(BufReader::new(file))? {
        InputFile::Many(messages) => messages,
        InputFile::One(message) => vec![*message],
    })
}

fn is_valid(tx: &ParsedTransaction) -> bool {
    match validate(tx) {
        Ok(()) => true,
        Err(issues) => {
            let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
            warn!(id = tx.document_key(), ?issues, "dropping invalid transaction");
            false
        }
    }
}
