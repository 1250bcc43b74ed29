//! Linflow CLI - linear task-chain composer

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use linflow::{
    canonicalize, ChainFile, EventLog, FixSuggestion, LinflowConfig, LinflowError, Runner,
};

#[derive(Parser)]
#[command(name = "linflow")]
#[command(about = "Linflow - linear task chains with checked data contracts")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.config/linflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a chain file and check every adjacency contract
    Validate {
        /// Path to chain YAML file
        file: PathBuf,
    },

    /// Print execution order with each task's requires/provides
    Order {
        /// Path to chain YAML file
        file: PathBuf,
    },

    /// Run a chain, rolling back on failure
    Run {
        /// Path to chain YAML file
        file: PathBuf,

        /// Include the event log in the output
        #[arg(long)]
        events: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = LinflowConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Validate { file } => validate_chain(&file, &config),
        Commands::Order { file } => print_order(&file, &config),
        Commands::Run { file, events } => run_chain(&file, &config, events),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn validate_chain(file: &Path, config: &LinflowConfig) -> Result<(), LinflowError> {
    let chain_file = ChainFile::load(file)?;
    let chain = chain_file.build(&config.runner)?;

    println!(
        "{} Chain '{}' is valid ({} tasks)",
        "✓".green(),
        chain.name().cyan().bold(),
        chain.len()
    );
    if let Some(description) = &chain_file.description {
        println!("  {}", description.dimmed());
    }

    Ok(())
}

fn print_order(file: &Path, config: &LinflowConfig) -> Result<(), LinflowError> {
    let chain = ChainFile::load(file)?.build(&config.runner)?;

    println!("{} {}", "Chain:".cyan().bold(), chain.name());
    for (index, task) in chain.order().iter().enumerate() {
        println!(
            "  {}. {} [{}] requires {} provides {}",
            index + 1,
            task.name().bold(),
            task.kind(),
            canonicalize(task.declared_requires()),
            canonicalize(task.declared_provides()),
        );
    }

    Ok(())
}

fn run_chain(file: &Path, config: &LinflowConfig, show_events: bool) -> Result<(), LinflowError> {
    let chain = ChainFile::load(file)?.build(&config.runner)?;
    let event_log = EventLog::new();
    let runner = Runner::new(chain.freeze()).with_event_log(event_log.clone());

    let report = match runner.run() {
        Ok(report) => report,
        Err(e) => {
            if show_events {
                eprintln!("{}", to_pretty(&event_log.to_json()));
            }
            return Err(e);
        }
    };

    let outputs = Value::Object(report.final_outputs);
    if show_events {
        println!(
            "{}",
            to_pretty(&json!({ "outputs": outputs, "events": event_log.to_json() }))
        );
    } else {
        println!("{}", to_pretty(&outputs));
    }

    Ok(())
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
