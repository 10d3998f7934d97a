mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "Editor-embedded AI assistant: console, selection completion and structured edits"
)]
struct Cli {
    /// Configuration document (JSON or TOML); defaults to $QUILL_CONFIG or the user config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive AI console over the given files
    Chat {
        /// Files to open alongside the console
        files: Vec<PathBuf>,
    },

    /// Run one instruction and print the reply
    Ask {
        /// Instruction text; ignored with `--selection`
        instruction: Vec<String>,

        /// File to run against; other open files can be referenced with @name
        #[arg(long)]
        file: Option<PathBuf>,

        /// Byte range `start:end` of `--file`; the selected text is the
        /// instruction and is replaced by the reply
        #[arg(long, requires = "file")]
        selection: Option<String>,
    },

    /// Show the configuration file, servers and agents
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = cli::config_store(args.config.as_deref());

    match args.command.unwrap_or(Commands::Chat { files: Vec::new() }) {
        Commands::Chat { files } => cli::chat::handle_chat_command(store, &files).await,
        Commands::Ask {
            instruction,
            file,
            selection,
        } => {
            cli::ask::handle_ask_command(
                store,
                &instruction.join(" "),
                file.as_deref(),
                selection.as_deref(),
            )
            .await
        }
        Commands::Config { init } => cli::config::handle_config_command(&store, init),
    }
}
