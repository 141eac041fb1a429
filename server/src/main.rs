// server/src/main.rs

// Entry point for the SNOMED CT graph seeding server: wires the in-memory
// graph store, the checkpoint store, and the seeding service, then serves
// the control API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use graph_engine::{GraphRepository, GraphService};
use log::info;
use seeding_service::{CheckpointStore, SnomedConfig, SnomedSeedingService};
use tokio::signal::unix::{signal, SignalKind};

mod routes;

use routes::snomed_routes;

async fn handle_signals(shutdown: Arc<AtomicBool>) {
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to set up SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, pausing any active seed job...");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, pausing any active seed job...");
        }
    }

    // an in-flight seed observes the flag at its next safe point and leaves
    // a resumable checkpoint behind
    shutdown.store(true, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = SnomedConfig::load();
    info!(
        "SNOMED import directory: {}",
        config.import_directory.display()
    );

    GraphService::global_init().await?;
    let repository: Arc<dyn GraphRepository> = GraphService::get().await;
    let checkpoints = Arc::new(CheckpointStore::new(config.snapshot_directory()));
    let shutdown = Arc::new(AtomicBool::new(false));

    SnomedSeedingService::global_init(repository, checkpoints, config.clone(), shutdown.clone())
        .await
        .map_err(anyhow::Error::msg)?;

    tokio::spawn(handle_signals(shutdown));

    let service = SnomedSeedingService::get().await;
    let routes = snomed_routes(service);

    info!("SNOMED control API listening on port {}", config.http_port);
    warp::serve(routes).run(([0, 0, 0, 0], config.http_port)).await;

    Ok(())
}
