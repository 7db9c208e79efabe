use alert_parser::{
    AcceptancePolicy, Analysis, DateTimeResolver, Engine, EngineConfig, ExtractError, RawMessage,
    matcher::AttemptOutcome,
};
use chrono_tz::Tz;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cli_analyze",
    version,
    about = "Shows how one alert email goes through template matching.",
    long_about = None,
)]
struct Args {
    /// Message file (mail-API JSON)
    #[arg(long)]
    input: PathBuf,

    /// Do not print the raw body
    #[arg(long)]
    suppress_html: bool,

    /// Zone for dates that carry none (IANA name), system zone when absent
    #[arg(long)]
    tz: Option<Tz>,

    /// Require every field, and the date where the template declares one
    #[arg(long)]
    strict: bool,

    /// Print the whole analysis as JSON instead of a report
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
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

    if !args.input.exists() {
        eprintln!("input file does not exist: {}", args.input.display());
        process::exit(1)
    }

    let file = File::open(&args.input)?;
    let message: RawMessage = serde_json::from_reader(BufReader::new(file))?;

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

    let analysis = engine.analyze(&message);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_report(&message, &analysis, args.suppress_html)?;
    }

    Ok(())
}

fn print_report(message: &RawMessage, analysis: &Analysis, suppress_html: bool) -> Result<(), ExtractError> {
    println!("== headers");
    for header in message.headers() {
        println!("  {}: {}", header.name, header.value);
    }

    println!("\n== sanitized body");
    println!("{}", analysis.bodies.sanitized);
    if !suppress_html {
        println!("\n== raw body");
        println!("{}", analysis.bodies.raw);
    }

    println!("\n== attempts");
    for attempt in &analysis.trace.attempts {
        let outcome = match &attempt.outcome {
            AttemptOutcome::FilteredOut { filter } => format!("filtered out by {filter}"),
            AttemptOutcome::Probed {
                variant,
                fields,
                accepted,
            } => {
                let verdict = if *accepted { "accepted" } else { "rejected" };
                format!("{variant:?}: {verdict}, missing {:?}", fields.missing(false))
            }
            AttemptOutcome::BlockedVendor { variant, vendor } => format!("{variant:?}: vendor '{vendor}' blocked"),
            AttemptOutcome::Failed { variant, error } => format!("{variant:?}: failed: {error}"),
        };
        println!("  {:<40} {outcome}", attempt.template);
    }
    println!("  state: {:?}", analysis.trace.state);

    println!("\n== result");
    match (&analysis.trace.winner, &analysis.matched_fields) {
        (Some(winner), Some(fields)) => {
            println!("  template: {winner} ({:?})", analysis.matched_variant);
            println!("  fields: {}", serde_json::to_string(fields)?);
        }
        _ => println!("  no template matched"),
    }
    match &analysis.transaction {
        Some(tx) => println!("{}", serde_json::to_string_pretty(tx)?),
        None => println!("  no transaction"),
    }

    Ok(())
}
