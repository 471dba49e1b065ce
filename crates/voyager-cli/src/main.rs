//! Voyager CLI - load, render and serve GraphQL schema graphs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use voyager_ops::Config;

mod commands;

use commands::{config as config_cmd, DisplayArgs, SourceArgs};

/// Voyager CLI - explore GraphQL schemas as graphs.
///
/// A schema comes from an endpoint (`--url`), a named preset (`--preset`)
/// or an introspection file (`--file`).
#[derive(Parser, Debug)]
#[command(
    name = "voyager",
    author,
    version,
    about = "Voyager: explore GraphQL schemas as graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a schema and print a summary.
    Load {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render a schema as a Graphviz DOT graph.
    Render {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        display: DisplayArgs,

        /// Write the graph to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the configured presets.
    Presets {
        /// Presets file or directory (overrides config).
        #[arg(long)]
        presets: Option<PathBuf>,
    },

    /// Apply a JSON array of events to an empty state and print the result.
    Replay {
        /// File containing the events.
        events: PathBuf,
    },

    /// Load a schema (if given) and serve the API.
    Serve {
        #[command(flatten)]
        source: SourceArgs,

        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity; RUST_LOG wins when set
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN // Default to less noise
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = Config::load()?;

    match cli.command {
        Commands::Load { source } => {
            commands::load::execute(&config, &source).await?;
        }

        Commands::Render {
            source,
            display,
            output,
        } => {
            commands::render::execute(&config, &source, &display, output.as_deref()).await?;
        }

        Commands::Presets { presets } => {
            commands::presets::execute(&config, presets.as_deref())?;
        }

        Commands::Replay { events } => {
            commands::replay::execute(&events)?;
        }

        Commands::Serve { source, port } => {
            commands::serve::execute(&config, &source, port).await?;
        }

        Commands::Config(config_cmd_inner) => {
            let mut config = config;
            match config_cmd_inner {
                ConfigCommands::Show => {
                    config_cmd::show(&config)?;
                }
                ConfigCommands::Set { key, value } => {
                    config_cmd::set(&mut config, &key, &value)?;
                }
                ConfigCommands::Get { key } => {
                    config_cmd::get(&config, &key)?;
                }
                ConfigCommands::Reset => {
                    config_cmd::reset()?;
                }
                ConfigCommands::Path => {
                    if let Some(path) = Config::config_file_path() {
                        println!("{}", path.display());
                    } else {
                        println!("(no config file path available)");
                    }
                }
            }
        }
    }

    Ok(())
}
