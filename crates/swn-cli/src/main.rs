use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use swn_cli::commands::{
    handle_catchments, handle_evaluate, handle_headwaters, handle_outlets, resolve_lookup,
    GlobalOptions,
};
use swn_cli::output::OutputFormat;
use swn_lib::LookupStrategy;

#[derive(Parser, Debug)]
#[command(author, version, about = "Surface water network topology utilities")]
struct Cli {
    /// Endpoint lookup strategy: auto, indexed or linear. Defaults to SWN_LOOKUP, then auto.
    #[arg(long, global = true)]
    lookup: Option<LookupStrategy>,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Suppress the warnings summary and warning log events.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the network and print the reach table.
    Evaluate {
        /// Line table JSON file.
        file: PathBuf,
    },
    /// Print outlet line identifiers.
    Outlets {
        /// Line table JSON file.
        file: PathBuf,
    },
    /// Print headwater line identifiers.
    Headwaters {
        /// Line table JSON file.
        file: PathBuf,
    },
    /// Print each outlet with the number of lines in its catchment.
    Catchments {
        /// Line table JSON file.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let global = GlobalOptions {
        lookup: resolve_lookup(cli.lookup)?,
        format: cli.format,
        quiet: cli.quiet,
    };

    match &cli.command {
        Command::Evaluate { file } => handle_evaluate(file, &global),
        Command::Outlets { file } => handle_outlets(file, &global),
        Command::Headwaters { file } => handle_headwaters(file, &global),
        Command::Catchments { file } => handle_catchments(file, &global),
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
