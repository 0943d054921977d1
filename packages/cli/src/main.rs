mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{add, init, inspect, remove, set, AddArgs, InitArgs, InspectArgs, RemoveArgs, SetArgs};
use tracing_subscriber::EnvFilter;

/// Animgraph CLI - inspect and edit animation node-graph projects
#[derive(Parser, Debug)]
#[command(name = "animgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log document commits and history changes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config and an empty project
    Init(InitArgs),

    /// Print the node tree, sampled property values and connections
    Inspect(InspectArgs),

    /// Add a node
    Add(AddArgs),

    /// Set a property keyframe
    Set(SetArgs),

    /// Remove a node and its descendants
    Remove(RemoveArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Add(args) => add(args, &cwd),
        Command::Set(args) => set(args, &cwd),
        Command::Remove(args) => remove(args, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
