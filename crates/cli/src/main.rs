//! smsfwd CLI: the main entry point.
//!
//! Commands:
//! - `run`: poll every configured modem until stopped
//! - `once`: run a single poll cycle and print what happened
//! - `preview`: parse and reassemble a captured feed, nothing is sent
//! - `config`: validate or show a configuration file
//! - `doctor`: check the environment the daemon depends on

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "smsfwd",
    about = "smsfwd: forward SMS from cellular modems to webhooks, bots and scripts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level; RUST_LOG takes precedence when set
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Run {
        /// Configuration file (.json or .toml)
        #[arg(env = "SMSFWD_CONFIG")]
        config: PathBuf,
    },

    /// Poll every modem once, then exit
    Once {
        /// Configuration file (.json or .toml)
        #[arg(env = "SMSFWD_CONFIG")]
        config: PathBuf,
    },

    /// Show the messages a captured feed would produce
    Preview {
        /// Feed file, or `-` for stdin
        feed: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose the runtime environment
    Doctor {
        /// Configuration file (.json or .toml)
        #[arg(env = "SMSFWD_CONFIG")]
        config: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate a configuration file
    Validate {
        #[arg(env = "SMSFWD_CONFIG")]
        config: PathBuf,
    },

    /// Print the normalized configuration as TOML, secrets redacted
    Show {
        #[arg(env = "SMSFWD_CONFIG")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

fn init_tracing(cli: &Cli) {
    let level = match (cli.log_level, cli.verbose) {
        (Some(level), _) => level.as_filter(),
        (None, true) => "debug",
        (None, false) => "info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Run { config } => commands::run::run(&config).await?,
        Commands::Once { config } => commands::once::run(&config).await?,
        Commands::Preview { feed } => commands::preview::run(&feed).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate { config } => commands::config_cmd::validate(&config).await?,
            ConfigAction::Show { config } => commands::config_cmd::show(&config).await?,
        },
        Commands::Doctor { config } => commands::doctor::run(&config).await?,
    }

    Ok(())
}
