//! Chess Worlds - Unified CLI
//!
//! Feedback relay, content management and terminal play.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use chess_worlds::{
    AppConfig, ContentRepository, JsonFileRepository, LevelCatalog, PlaySession, SessionOutcome,
    player_overview, serve, transport_from_config,
};
use chess_worlds_core::{LevelRunner, ShakmatyOracle};
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Serve { .. }));

    let config = AppConfig::load(&cli.config)?;
    let repository = JsonFileRepository::new(config.content_path());

    match cli.command {
        Command::Serve { host, port } => run_server(config.with_listen(host, port)).await,
        Command::Worlds => list_worlds(&repository),
        Command::Validate => validate(&repository),
        Command::Play { level } => play(&repository, &level),
        Command::Export { file } => {
            let bundle = repository.export_bundle();
            std::fs::write(&file, serde_json::to_string_pretty(&bundle)?)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!(
                "Exported {} games and {} players to {}",
                bundle.games_source().len(),
                bundle.players_source().len(),
                file.display()
            );
            Ok(())
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            repository.import_json(&text)?;
            println!("Imported {}", file.display());
            Ok(())
        }
        Command::Reset => {
            repository.reset_to_defaults()?;
            println!("Content reset to the built-in defaults");
            Ok(())
        }
    }
}

/// Logs go to stderr; the server defaults to `info`, interactive commands to `warn`.
fn init_tracing(server: bool) {
    let default = if server { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

/// Run the feedback relay
#[instrument(skip_all)]
async fn run_server(config: AppConfig) -> Result<()> {
    info!("Starting Chess Worlds support server");
    let transport = transport_from_config(config.mail())?;
    serve(config, transport).await?;
    Ok(())
}

fn list_worlds(repository: &JsonFileRepository) -> Result<()> {
    let bundle = repository.load_bundle();
    let catalog = LevelCatalog::from_bundle(&bundle, ShakmatyOracle::new());

    for (index, world) in catalog.worlds().iter().enumerate() {
        println!("World {} – {}", index + 1, world.name());
        for level in world.levels() {
            println!("  {:<45} {} (as {})", level.id(), level.title(), level.player_side());
        }
    }

    println!();
    for (player, stats) in player_overview(&bundle) {
        println!(
            "{:<24} games {:>2}  white {:>2}  black {:>2}  eras {}{}",
            player.name(),
            stats.total(),
            stats.as_white(),
            stats.as_black(),
            stats.eras().join(", "),
            if *player.show() { "" } else { "  (hidden)" }
        );
    }
    Ok(())
}

fn validate(repository: &JsonFileRepository) -> Result<()> {
    let catalog = LevelCatalog::from_repository(repository, ShakmatyOracle::new());
    let total = catalog.levels().count();
    let failures = catalog.validate_all();

    for failure in &failures {
        println!("FAIL {}", failure);
    }
    println!("{} of {} levels load", total - failures.len(), total);

    if !failures.is_empty() {
        warn!(failures = failures.len(), "Validation failed");
        bail!("{} level(s) failed to load", failures.len());
    }
    Ok(())
}

fn play(repository: &JsonFileRepository, level_id: &str) -> Result<()> {
    let catalog = LevelCatalog::from_repository(repository, ShakmatyOracle::new());
    let level = catalog.load_level(level_id)?;
    let runner = LevelRunner::new(ShakmatyOracle::new(), level.definition().clone());

    let stdin = std::io::stdin();
    let mut session = PlaySession::new(
        level.entry().title().clone(),
        runner,
        *level.budget(),
        stdin.lock(),
        std::io::stdout(),
    );
    match session.run()? {
        SessionOutcome::Completed(card) => info!(score = *card.score(), "Session finished"),
        SessionOutcome::Abandoned => info!("Session abandoned"),
    }
    Ok(())
}
