//! hite CLI: run a check-in from the terminal and inspect the results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hite", version, about = "Self-assessment check-ins with scored results")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question set interactively
    Run {
        /// Path to a .toml or .json question set (default: config, then the built-in set)
        #[arg(long)]
        question_set: Option<PathBuf>,
    },

    /// Show the results of the last finished session
    Summary {
        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Add the session's points to the score board
        #[arg(long)]
        commit: bool,
    },

    /// Rate the last session (0-5 stars each)
    Feedback {
        #[arg(long, default_value = "0")]
        helpful: u8,

        #[arg(long, default_value = "0")]
        engaging: u8,

        /// Discard the saved rating instead
        #[arg(long)]
        clear: bool,
    },

    /// Validate question set files
    Validate {
        /// Path to a question set file or directory
        #[arg(long)]
        question_set: PathBuf,
    },

    /// Remove everything hite has written to the store
    Reset,

    /// Create a starter config and the built-in question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hite=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Run { question_set } => commands::run::execute(question_set, config).await,
        Commands::Summary { format, commit } => commands::summary::execute(format, commit, config),
        Commands::Feedback {
            helpful,
            engaging,
            clear,
        } => commands::feedback::execute(helpful, engaging, clear, config),
        Commands::Validate { question_set } => commands::validate::execute(question_set),
        Commands::Reset => commands::reset::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
