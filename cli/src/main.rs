use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gearset_config::{ScrapeConfig, validate_config};
use gearset_core::{Ruleset, aggregate, render_entries};
use gearset_scrape::extract::{ExtractError, extract};
use gearset_scrape::fetch::{DirectoryFetcher, HttpFetcher, PageFetcher};
use gearset_scrape::pipeline::generate;
use gearset_scrape::report::{RunReport, failure_code_summary};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "gearset-scrape")]
#[command(about = "Generate tier gear-set lookup tables from item-set listing pages")]
#[command(version)]
struct Cli {
    /// Log debug output. `RUST_LOG` takes precedence when set.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every (tier, class) pair and write one table per ruleset.
    Generate(GenerateArgs),
    /// Extract one saved listing page and print its table lines.
    ParseFile(ParseFileArgs),
    /// Write the built-in configuration as YAML.
    InitConfig(InitConfigArgs),
    /// Check a configuration file and report every problem.
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Debug, Default, Args)]
struct GenerateArgs {
    /// YAML configuration; the built-in tables are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ruleset to generate (repeatable). Defaults to all configured rulesets.
    #[arg(long = "ruleset", value_name = "RULESET")]
    rulesets: Vec<Ruleset>,
    /// Directory the tables are written into.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Number of pages fetched concurrently.
    #[arg(long)]
    jobs: Option<usize>,
    /// Read saved pages from this directory instead of the network.
    #[arg(long)]
    pages_dir: Option<PathBuf>,
    /// Write a JSON run report to this file.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Saved listing page.
    #[arg(long)]
    input: PathBuf,
    /// Tier label used in the keys.
    #[arg(long)]
    tier: String,
    /// Class label used in the keys.
    #[arg(long)]
    class: String,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination YAML file.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct ValidateConfigArgs {
    /// YAML configuration to check.
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        None => run_generate(GenerateArgs::default()),
        Some(Command::Generate(args)) => run_generate(args),
        Some(Command::ParseFile(args)) => run_parse_file(args),
        Some(Command::InitConfig(args)) => run_init_config(args),
        Some(Command::ValidateConfig(args)) => run_validate_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "gearset=debug" } else { "gearset=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => ScrapeConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ScrapeConfig::default(),
    };

    for ruleset in &args.rulesets {
        config.ruleset(*ruleset).map_err(|err| err.to_string())?;
    }
    config.retain_rulesets(&args.rulesets);
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            return Err("--jobs must be at least 1".to_string());
        }
        config.jobs = jobs;
    }

    let fetcher: Box<dyn PageFetcher> = match args.pages_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading saved pages");
            Box::new(DirectoryFetcher::new(dir))
        }
        None => Box::new(HttpFetcher::new(&config.http, &config.rulesets)),
    };

    let report = generate(&config, fetcher.as_ref()).map_err(|err| err.to_string())?;

    for ruleset in &report.rulesets {
        println!(
            "Wrote {} entries to {} ({} pair(s), {} failed).",
            ruleset.entries_written,
            ruleset.output_path.display(),
            ruleset.pairs.len(),
            ruleset.failed_pairs().count()
        );
    }
    print_failures(&report);

    if let Some(path) = &args.report {
        report
            .save(path)
            .map_err(|err| format!("Failed to write report '{}': {err}", path.display()))?;
    }

    Ok(())
}

fn print_failures(report: &RunReport) {
    let count = report.failure_count();
    if count == 0 {
        return;
    }
    let summary = failure_code_summary(report.failures().map(|(_, pair)| pair));
    let breakdown: Vec<String> = summary
        .iter()
        .map(|(code, n)| format!("{n} {code}"))
        .collect();
    eprintln!("{count} pair failure(s) ({}):", breakdown.join(", "));
    for (ruleset, pair) in report.failures() {
        eprintln!(
            "  {ruleset} tier {} {}: {}",
            pair.tier,
            pair.class_label,
            pair.failure_detail.as_deref().unwrap_or("unknown failure")
        );
    }
}

fn run_parse_file(args: ParseFileArgs) -> Result<(), String> {
    let raw = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;

    let records = match extract(&raw) {
        Ok(records) => records,
        Err(ExtractError::NotFound) => {
            info!(input = %args.input.display(), "no listing on page");
            Vec::new()
        }
        Err(err) => return Err(format!("{}: {err}", args.input.display())),
    };

    let set = aggregate(&records);
    for collision in set.collisions() {
        warn!(
            name = %collision.name,
            level = collision.level_variant,
            previous = collision.previous_item_id,
            kept = collision.item_id,
            "duplicate set entry, keeping the later item id"
        );
    }
    for entry in render_entries(&set, &args.tier, &args.class) {
        println!("{entry}");
    }
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    ScrapeConfig::default()
        .save(&args.output)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!("Wrote default configuration to {}.", args.output.display());
    Ok(())
}

fn run_validate_config(args: ValidateConfigArgs) -> Result<(), String> {
    let config = ScrapeConfig::read(&args.config)
        .map_err(|err| format!("Failed to read '{}': {err}", args.config.display()))?;

    let errors = validate_config(&config);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  {err}");
        }
        return Err(format!(
            "{} validation error(s) in '{}'",
            errors.len(),
            args.config.display()
        ));
    }

    let pairs: usize = config.rulesets.iter().map(|d| d.pair_count()).sum();
    println!(
        "{}: {} ruleset(s), {pairs} pair(s), OK.",
        args.config.display(),
        config.rulesets.len()
    );
    Ok(())
}
