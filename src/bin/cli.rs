//! Announcement relay CLI
//!
//! Local execution entry point: runs the monitor and the liveness endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notice_relay::{
    error::{AppError, Result},
    models::Config,
    pipeline::Monitor,
    server,
    services::{
        AnnouncementScraper, AnnouncementSource, Classifier, MessageFormatter, Notifier,
        TelegramNotifier,
    },
};

/// notice-relay - University announcement relay for Telegram
#[derive(Parser, Debug)]
#[command(
    name = "notice-relay",
    version,
    about = "Relays new university announcements to Telegram group chats"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the page and relay new announcements (default)
    Run,

    /// Scrape once and print what was found, without sending anything
    Check,

    /// Validate configuration
    Validate,
}

/// Initialize logging; `RUST_LOG` wins over the level from the config file.
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    let loaded = Config::load(&cli.config);
    let level = match &loaded {
        Ok(config) => config.logging.level.as_str(),
        Err(_) => "info",
    };
    init_logging(level, cli.verbose);

    log::info!("notice-relay v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Err(e) if matches!(command, Command::Validate) => {
            log::error!("Config load failed from {}: {}", cli.config.display(), e);
            return Err(e);
        }
        Err(e) => {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                cli.config.display(),
                e
            );
            Config::default()
        }
    };
    config.apply_env();
    let config = Arc::new(config);

    match command {
        Command::Run => run(config).await?,
        Command::Check => check(&config).await?,
        Command::Validate => validate(&config)?,
    }

    Ok(())
}

/// Start the liveness endpoint and the monitor; report a dying monitor.
async fn run(config: Arc<Config>) -> Result<()> {
    config.validate()?;
    config.require_delivery()?;

    server::spawn(config.server.clone());

    let failure = match Monitor::from_config(&config) {
        Ok(monitor) => match tokio::spawn(monitor.run()).await {
            Ok(()) => "monitor loop exited".to_string(),
            Err(e) => format!("monitor task panicked: {e}"),
        },
        Err(e) => e.to_string(),
    };

    log::error!("FATAL ERROR in main task: {}", failure);
    report_crash(&config, &failure).await;
    Err(AppError::Fatal(failure))
}

/// Best-effort crash report to the owner chat.
async fn report_crash(config: &Config, failure: &str) {
    let Some(owner) = config.telegram.owner_chat_id.as_deref() else {
        return;
    };

    let text = MessageFormatter::new(&config.source.url).crash_report(failure);
    let sent = match TelegramNotifier::new(config) {
        Ok(notifier) => notifier.send(owner, &text).await,
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        log::error!("Could not deliver crash report to {}: {}", owner, e);
    }
}

/// Scrape once and log the parsed announcements with their tags.
async fn check(config: &Config) -> Result<()> {
    config.validate()?;

    let scraper = AnnouncementScraper::new(config)?;
    let classifier = Classifier::new(config.tags.clone());
    let announcements = scraper.fetch().await?;

    log::info!(
        "Found {} announcement(s) on {}",
        announcements.len(),
        scraper.url()
    );
    for (i, announcement) in announcements.iter().enumerate() {
        let tags = classifier.classify(announcement.title());
        log::info!("[{}] {}", i + 1, announcement.title());
        log::info!("    Date: {}", announcement.date());
        log::info!("    Id: {}", announcement.id());
        if !tags.is_empty() {
            log::info!("    Tags: {}", tags.join(" "));
        }
        log::info!(
            "    Preview lines: {}",
            announcement.content_preview().len()
        );
    }
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK ({} tag rule(s))", config.tags.len());

    match config.require_delivery() {
        Ok(()) => log::info!(
            "✓ Delivery OK ({} destination chat(s))",
            config.telegram.chat_ids.len()
        ),
        Err(e) => log::warn!("Delivery not ready: {}", e),
    }

    log::info!("All validations passed!");
    Ok(())
}
