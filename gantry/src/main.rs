mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Dependency-ordered task runner with watch mode")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the task manifest.
    #[arg(long, default_value = "gantry.toml")]
    manifest_path: PathBuf,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tasks and their dependency closures.
    Run {
        /// Tasks to run; defaults to the 'default' task if one exists.
        tasks: Vec<String>,
        #[arg(short = 'j', long)]
        parallel: Option<usize>,
        /// Buffer task output instead of streaming it live.
        #[arg(long, action)]
        no_stream: bool,
    },
    /// List registered tasks.
    List {
        #[arg(long, action)]
        json: bool,
    },
    /// Show the dependency graph in execution order.
    Graph {
        #[arg(long, action)]
        json: bool,
    },
    /// Check the manifest for cycles and unknown dependencies.
    Validate {
        #[arg(long, action)]
        json: bool,
    },
    /// Re-run bound tasks when watched files change.
    Watch {
        /// Restrict change-triggered runs to these tasks.
        tasks: Vec<String>,
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    match cli.command {
        Commands::Run {
            tasks,
            parallel,
            no_stream,
        } => commands::cmd_run(cli.manifest_path, tasks, parallel, no_stream)?,
        Commands::List { json } => commands::cmd_list(cli.manifest_path, json)?,
        Commands::Graph { json } => commands::cmd_graph(cli.manifest_path, json)?,
        Commands::Validate { json } => commands::cmd_validate(cli.manifest_path, json)?,
        Commands::Watch { tasks, debounce_ms } => {
            commands::cmd_watch(cli.manifest_path, tasks, debounce_ms)?
        }
    }

    Ok(())
}
