//! Controle Tecnicos - HTTP service that dispatches the nearest technician
//!
//! Serves `POST /calcular` by default; the other subcommands run a single
//! lookup from the command line.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use controle_tecnicos::cli::{Cli, Command};
use controle_tecnicos::config::Config;
use controle_tecnicos::handlers::{build_app, AppState};
use controle_tecnicos::services::matching::MatchEngine;
use controle_tecnicos::types::{CalculateResponse, Coordinates, TechnicianPayload};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "controle-tecnicos.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - console (stderr, stdout carries CLI output) and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,controle_tecnicos=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = Config::from_env()?;
    info!(
        "Configuration loaded (geocoder: {:?}, routing: {:?}, roster: {})",
        config.geocoder_backend,
        config.routing_backend,
        config.roster_path.display()
    );

    let engine = MatchEngine::from_config(&config)?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(engine, &config).await,
        Command::Geocode { address } => geocode(&engine, &address).await,
        Command::Reverse { lat, lon } => reverse(&engine, lat, lon).await,
        Command::Match { address } => run_match(&engine, &address).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn serve(engine: MatchEngine, config: &Config) -> Result<()> {
    let app = build_app(AppState::new(engine), config.static_dir.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn geocode(engine: &MatchEngine, address: &str) -> Result<()> {
    match engine.resolver().resolve_with_strategy(address).await? {
        Some(resolution) => {
            let output = serde_json::json!({
                "coords": resolution.coordinates,
                "strategy": resolution.strategy.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        None => anyhow::bail!("Address not found: {}", address),
    }
}

async fn reverse(engine: &MatchEngine, lat: f64, lon: f64) -> Result<()> {
    let at = Coordinates::new(lat, lon)
        .with_context(|| format!("Coordinates out of range: {}, {}", lat, lon))?;

    match engine.resolver().primary().reverse(at).await? {
        Some(place) => {
            println!("{}", serde_json::to_string_pretty(&place)?);
            Ok(())
        }
        None => anyhow::bail!("Nothing found at {}, {}", lat, lon),
    }
}

async fn run_match(engine: &MatchEngine, address: &str) -> Result<()> {
    let result = engine.match_address(address).await?;
    info!("Compared {} technicians", result.candidates);

    let response = CalculateResponse {
        tecnico: TechnicianPayload::from(&result.technician),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, starting graceful shutdown");
}
