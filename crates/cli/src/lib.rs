pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use soundrent_core::config::{AppConfig, LoadOptions};

use crate::commands::{quote::QuoteArgs, CommandResult, EXIT_CONFIG};

#[derive(Debug, Parser)]
#[command(
    name = "soundrent",
    about = "Soundrent sales assistant CLI",
    long_about = "Classify customer messages, compute deterministic quotes, replay chat turns and inspect configuration.",
    after_help = "Examples:\n  soundrent classify \"un mariage pour 120 personnes\"\n  soundrent quote --guests 120 --event mariage --department 75\n  soundrent turn --transcript turn.json\n  soundrent config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to soundrent.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify one message and list the event details it mentions")]
    Classify { message: String },
    #[command(about = "Recommend a pack and price it")]
    Quote(QuoteArgs),
    #[command(about = "Run one assistant turn from a JSON transcript")]
    Turn {
        #[arg(long, help = "JSON file with `messages` and optional side-channel fields")]
        transcript: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
}

fn init_logging(config: &AppConfig) {
    use soundrent_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

fn load_config(path: Option<PathBuf>, command: &str) -> Result<AppConfig, CommandResult> {
    let options = LoadOptions { require_file: path.is_some(), config_path: path, ..LoadOptions::default() };
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let now = Local::now().naive_local();

    let result = match cli.command {
        Command::Classify { message } => commands::classify::run(&message, now.date()),
        Command::Quote(args) => match load_config(cli.config, "quote") {
            Ok(config) => commands::quote::run(&config, &args, now),
            Err(failure) => failure,
        },
        Command::Turn { transcript } => match load_config(cli.config, "turn") {
            Ok(config) => {
                init_logging(&config);
                commands::turn::run(&config, &transcript)
            }
            Err(failure) => failure,
        },
        Command::Config => commands::config::run(cli.config.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
