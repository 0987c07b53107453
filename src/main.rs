//! klinewatch - headless client for a market-data anomaly detector
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use klinewatch::headless::HeadlessEvent;
use klinewatch_app::config::{self, SettingsOverrides};
use klinewatch_core::logging;

/// klinewatch - watch a k-line anomaly detector from the command line
#[derive(Parser, Debug)]
#[command(name = "klinewatch")]
#[command(about = "Headless client for a market-data anomaly detector", long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server base URL (overrides config)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Account user name (overrides config)
    #[arg(long)]
    user: Option<String>,

    /// Account password (overrides config)
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config file and exit
    Init,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(config::default_config_path);

    if let Some(Command::Init) = args.command {
        if config::init_config_file(&config_path)? {
            eprintln!("Created {}", config_path.display());
        } else {
            eprintln!("Config already exists: {}", config_path.display());
        }
        return Ok(());
    }

    // Log to file, stdout carries the event stream
    logging::init()?;

    let mut settings = config::load_settings(&config_path);
    settings.apply_overrides(SettingsOverrides {
        base_url: args.server,
        user: args.user,
        password: args.password,
    });

    if let Err(e) = settings.validate() {
        HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
        eprintln!("Cannot start: {}", e);
        eprintln!("Edit {} or pass --user/--password", config_path.display());
        return Err(e.into());
    }

    let result = klinewatch::run_headless(settings).await;

    if let Err(ref e) = result {
        tracing::error!("Application error: {:?}", e);
        if let Ok(log_file) = logging::get_current_log_file() {
            eprintln!("See logs in {}", log_file.display());
        }
    }

    Ok(result?)
}
