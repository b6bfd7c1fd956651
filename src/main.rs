#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use game_hub_server::config;
use game_hub_server::hub::Hub;
use game_hub_server::logging;
use game_hub_server::net;
use game_hub_server::store::{snapshot, Catalog, UserStore};

/// Game Hub -- game-distribution and matchmaking hub server
#[derive(Parser, Debug)]
#[command(name = "game-hub-server")]
#[command(about = "A game-distribution and matchmaking hub server over a framed TCP protocol")]
#[command(version)]
struct Cli {
    /// Listen port, overriding the configured value.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load();
    if let Some(port) = cli.port {
        cfg.port = port;
    }

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Public address: {}", cfg.public_addr);
                println!("  Data directory: {}", cfg.storage.data_dir);
                println!("  Upload root: {}", cfg.storage.upload_root);
                println!("  Download chunk size: {}", cfg.server.download_chunk_size);
                println!(
                    "  Ready-check timeout: {}s",
                    cfg.server.ready_check_timeout_secs
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result.map_err(|e| anyhow::anyhow!("Configuration invalid:\n{e}"))?;

    logging::init_with_config(&cfg.logging);
    let cfg = Arc::new(cfg);

    // Recover persisted state before accepting anyone. A corrupt snapshot
    // aborts startup rather than silently starting empty.
    let users: UserStore = snapshot::load_json(&cfg.storage.users_path())?;
    let catalog: Catalog = snapshot::load_json(&cfg.storage.games_path())?;
    if !catalog.is_empty() {
        tracing::info!(games = catalog.list().len(), "Catalogue recovered from snapshot");
    }

    for dir in [
        &cfg.storage.data_dir,
        &cfg.storage.upload_root,
        &cfg.storage.session_root,
    ] {
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("Failed to create directory {dir}: {e}"))?;
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let hub = Hub::new(cfg.clone(), users, catalog, events_tx.clone());
    tokio::spawn(hub.run(events_rx));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        public_addr = %cfg.public_addr,
        "Game hub listening"
    );

    tokio::select! {
        result = net::serve(listener, events_tx, cfg.server.max_frame_len) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
