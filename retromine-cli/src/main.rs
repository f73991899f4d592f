//! # RetroMine CLI - Template Mining from Route Collections
//!
//! A command-line interface for mining reaction templates out of
//! retrosynthesis search output.
//!
//! ## Usage
//!
//! ```bash
//! # Popular templates of one search
//! retromine mine --primary routes.json --output-dir mined/
//!
//! # Unused templates from an alternative search, split by a reference library
//! retromine mine --primary standard.json --alternative wide.json \
//!     --library reference.txt --output-dir mined/
//!
//! # Stock-price costs, TSV tables
//! retromine mine --primary routes.json --stock stock.tsv --mode stock-cost \
//!     --format tsv --output-dir mined/
//!
//! # Compare an optimised search with the standard one
//! retromine compare --standard standard.json --optimised optimised.json
//! ```
//!
//! ## Options
//!
//! - `-q, --quiet`: Suppress the completion summary
//! - `RUST_LOG`: Log level filter (default: warn)
//!
//! ### `mine`
//!
//! - `--primary <FILE>`: Route collection to score
//! - `--alternative <FILE>`: Route collection mined for unused templates
//! - `--library <FILE>`: Reference template library for the overlooked/novel split
//! - `--stock <FILE>`: Stock table (JSON or TSV)
//! - `--config <FILE>`: JSON analysis configuration; flags override it
//! - `-m, --mode <MODE>`: state, stock-cost, ml-price or frequency (default: state)
//! - `--not-in-stock-cost <COST>`: Price of leaves missing from the stock (default: 10)
//! - `--merge-equivalent`: Merge identical templates before popularity scoring
//! - `-f, --format <FORMAT>`: json or tsv (default: json)
//! - `-j, --threads <N>`: Worker threads (default: auto)
//! - `-o, --output-dir <DIR>`: Directory for the written tables
//!
//! ### `compare`
//!
//! - `--standard <FILE>`, `--optimised <FILE>`: Route collections to compare
//! - `--stock <FILE>`, `-m, --mode <MODE>`, `--not-in-stock-cost <COST>`: As for `mine`
//! - `-o, --output <FILE>`: Output file (default: stdout)

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use env_logger::Env;
use retromine_core::TemplateMiner;
use retromine_core::chemistry::LexicalToolkit;
use retromine_core::config::{AnalysisConfig, OutputFormat, ScoringMode};
use retromine_core::io::{read_config, read_route_batch, read_stock_table, read_template_library};
use retromine_core::library::TemplateLibrary;
use retromine_core::output::write_mining_results;
use retromine_core::scoring::CostMaterials;

fn cli() -> Command {
    Command::new("retromine")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mine reaction templates from retrosynthesis route collections")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Suppress the completion summary"),
        )
        .subcommand(
            Command::new("mine")
                .about("Score popular and unused templates")
                .arg(path_arg("primary", "Route collection to score").required(true))
                .arg(path_arg(
                    "alternative",
                    "Route collection mined for unused templates",
                ))
                .arg(path_arg(
                    "library",
                    "Reference template library for the overlooked/novel split",
                ))
                .arg(path_arg("stock", "Stock table (JSON or TSV)"))
                .arg(path_arg(
                    "config",
                    "JSON analysis configuration; flags override it",
                ))
                .arg(mode_arg())
                .arg(not_in_stock_cost_arg())
                .arg(
                    Arg::new("merge-equivalent")
                        .long("merge-equivalent")
                        .action(ArgAction::SetTrue)
                        .help("Merge identical templates before popularity scoring"),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format: json or tsv"),
                )
                .arg(
                    Arg::new("threads")
                        .short('j')
                        .long("threads")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Worker threads (default: auto)"),
                )
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .required(true)
                        .help("Directory for the written tables"),
                ),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare an optimised search with a standard one")
                .arg(path_arg("standard", "Route collection of the standard search").required(true))
                .arg(
                    path_arg("optimised", "Route collection of the optimised search")
                        .required(true),
                )
                .arg(path_arg("stock", "Stock table (JSON or TSV)"))
                .arg(mode_arg())
                .arg(not_in_stock_cost_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default: stdout)"),
                ),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn mode_arg() -> Arg {
    Arg::new("mode")
        .short('m')
        .long("mode")
        .value_name("MODE")
        .help("Scoring mode: state, stock-cost, ml-price or frequency")
}

fn not_in_stock_cost_arg() -> Arg {
    Arg::new("not-in-stock-cost")
        .long("not-in-stock-cost")
        .value_name("COST")
        .value_parser(value_parser!(f64))
        .help("Price of leaves missing from the stock table")
}

/// Main entry point for the RetroMine CLI application.
///
/// Parses command-line arguments and dispatches to the requested
/// subcommand. Logging goes to stderr and follows `RUST_LOG`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("mine", sub)) => run_mine(sub),
        Some(("compare", sub)) => run_compare(sub),
        _ => Err("No subcommand given".into()),
    }
}

/// Builds the configuration from an optional JSON file overlaid with flags.
fn analysis_config(matches: &ArgMatches) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match matches.try_get_one::<PathBuf>("config").ok().flatten() {
        Some(path) => read_config(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(mode) = matches.get_one::<String>("mode") {
        config.scoring_mode = mode.parse::<ScoringMode>()?;
    }
    if let Some(&cost) = matches.get_one::<f64>("not-in-stock-cost") {
        config.not_in_stock_cost = cost;
    }
    if matches.try_get_one::<bool>("merge-equivalent").ok().flatten() == Some(&true) {
        config.merge_equivalent_templates = true;
    }
    if let Some(format) = matches.try_get_one::<String>("format").ok().flatten() {
        config.output_format = format.parse::<OutputFormat>()?;
    }
    if let Some(&threads) = matches.try_get_one::<usize>("threads").ok().flatten() {
        config.num_threads = Some(threads);
    }
    config.quiet |= matches.get_flag("quiet");
    Ok(config)
}

fn cost_materials(matches: &ArgMatches) -> Result<CostMaterials, Box<dyn std::error::Error>> {
    let mut materials = CostMaterials::default();
    if let Some(path) = matches.get_one::<PathBuf>("stock") {
        let stock = read_stock_table(path)?;
        log::info!("Loaded {} stock entries from {}", stock.len(), path.display());
        materials = materials.with_stock(stock);
    }
    Ok(materials)
}

fn run_mine(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = analysis_config(matches)?;
    let miner = TemplateMiner::new(config, Arc::new(LexicalToolkit), cost_materials(matches)?)?;

    let primary = read_route_batch(required_path(matches, "primary")?)?;
    let alternative = matches
        .get_one::<PathBuf>("alternative")
        .map(read_route_batch)
        .transpose()?;
    let library = match matches.get_one::<PathBuf>("library") {
        Some(path) => read_template_library(path)?,
        None => TemplateLibrary::new(),
    };

    let results = miner.mine(&primary, alternative.as_ref(), &library)?;

    let output_dir = required_path(matches, "output-dir")?;
    fs::create_dir_all(output_dir)?;
    let written = write_mining_results(output_dir, &results, miner.config().output_format)?;

    if !miner.config().quiet {
        eprintln!(
            "Mining complete! Wrote {} tables to {} ({} popular, {} unused templates).",
            written.len(),
            output_dir.display(),
            results.popular.len(),
            results.unused.as_ref().map_or(0, |unused| unused.len())
        );
    }
    Ok(())
}

fn run_compare(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = analysis_config(matches)?;
    let miner = TemplateMiner::new(config, Arc::new(LexicalToolkit), cost_materials(matches)?)?;

    let standard = read_route_batch(required_path(matches, "standard")?)?;
    let optimised = read_route_batch(required_path(matches, "optimised")?)?;
    let comparison = miner.compare(&standard, &optimised)?;

    let mut writer: Box<dyn Write> = if let Some(path) = matches.get_one::<PathBuf>("output") {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };
    serde_json::to_writer_pretty(&mut writer, &comparison)?;
    writeln!(writer)?;
    writer.flush()?;

    if !miner.config().quiet {
        eprintln!(
            "Comparison complete! {} standard and {} optimised targets.",
            standard.len(),
            optimised.len()
        );
    }
    Ok(())
}

fn required_path<'a>(
    matches: &'a ArgMatches,
    name: &str,
) -> Result<&'a PathBuf, Box<dyn std::error::Error>> {
    matches
        .get_one::<PathBuf>(name)
        .ok_or_else(|| format!("Missing required argument --{name}").into())
}
