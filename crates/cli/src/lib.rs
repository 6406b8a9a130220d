pub mod commands;

use clap::{Parser, Subcommand};
use lightquote_core::config::{AppConfig, ConfigOverrides, LogFormat};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "lightquote",
    about = "Lighting installation quote wizard",
    long_about = "Walk through the lighting questions, get a price from the pricing service, and place an order.",
    after_help = "Examples:\n  lightquote quote\n  lightquote steps --json\n  lightquote doctor"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer the wizard questions in the terminal, then place an order")]
    Quote {
        #[arg(long, help = "Override the pricing endpoint URL")]
        pricing_url: Option<String>,
        #[arg(long, help = "Override the checkout endpoint URL")]
        checkout_url: Option<String>,
        #[arg(long, help = "Override the log level (trace|debug|info|warn|error)")]
        log_level: Option<String>,
    },
    #[command(about = "Print the wizard step catalog")]
    Steps {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check that the service clients can be built")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote { pricing_url, checkout_url, log_level } => {
            commands::quote::run(ConfigOverrides {
                pricing_url,
                checkout_url,
                log_level,
                ..ConfigOverrides::default()
            })
        }
        Command::Steps { json } => commands::steps::run(json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Logs go to stderr so prompts on stdout
/// stay readable. A second call is ignored.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
