//! pcapi-build command-line interface
//!
//! Builds the compiled extension modules of the pcapi market-data binding
//! layer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

/// Display an error with its cause chain and optional backtrace
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "pcapi-build")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the pcapi market-data extension modules", long_about = None)]
pub(crate) struct Cli {
    /// Path to pcapi.toml (default: search current and parent directories)
    #[arg(long, global = true)]
    manifest: Option<String>,

    /// Print debug logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Show a backtrace for errors (requires `RUST_BACKTRACE=1`)
    #[arg(long, global = true)]
    backtrace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default pcapi.toml
    Init {
        /// Directory to create the manifest in
        #[arg(default_value = ".")]
        path: String,
    },

    /// List declared extension targets and whether they are enabled
    Targets {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enable a declared extension target
    Enable {
        /// Target name
        name: String,
    },

    /// Disable a declared extension target
    Disable {
        /// Target name
        name: String,
    },

    /// Show the assembled targets without building
    Plan {
        /// Platform to assemble for: windows, linux or macos (default: host)
        #[arg(long)]
        platform: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean, run the pre-build phases, then the standard build step
    Build {
        /// Platform to build for: windows, linux or macos (default: host)
        #[arg(long)]
        platform: Option<String>,

        /// Show toolchain commands and output
        #[arg(long)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long, short, conflicts_with = "verbose")]
        quiet: bool,

        /// Write a JSON build report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Remove the build directory
    Clean,

    /// Show platform detection and the platform's exclusions and libraries
    Platform {
        /// Platform to describe (default: host)
        #[arg(long)]
        platform: Option<String>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    pcapi_build::init_debug(cli.debug);

    let manifest = cli.manifest.as_deref();
    let result = match cli.command {
        Commands::Init { path } => commands::init::run(&path),
        Commands::Targets { json } => commands::targets::run(manifest, json),
        Commands::Enable { name } => commands::toggle::run(manifest, &name, true),
        Commands::Disable { name } => commands::toggle::run(manifest, &name, false),
        Commands::Plan { platform, json } => {
            commands::plan::run(manifest, platform.as_deref(), json)
        }
        Commands::Build {
            platform,
            verbose,
            quiet,
            report,
        } => commands::build::run(
            manifest,
            platform.as_deref(),
            verbose,
            quiet,
            report.as_deref(),
        ),
        Commands::Clean => commands::clean::run(manifest),
        Commands::Platform { platform } => commands::platform::run(manifest, platform.as_deref()),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        display_error(&e, cli.backtrace);
        process::exit(1);
    }
}

mod commands;
