mod api;
mod dto;
mod state;

use crate::state::AppState;
use axum::routing::{get, post};
use std::{path::PathBuf, sync::Arc, time::Instant};
use tracing::{error, info};
use transitnav::prelude::*;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Starting server...");
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        error!("Missing gtfs zip");
        std::process::exit(1);
    };
    let port = match std::env::var("PORT") {
        Ok(value) => value.parse().unwrap_or_else(|err| {
            error!("Invalid PORT {value}: {err}");
            std::process::exit(1);
        }),
        Err(_) => DEFAULT_PORT,
    };

    info!("Loading data...");
    let now = Instant::now();
    let repository = match GtfsReader::new()
        .from_zip(&path)
        .and_then(|gtfs| Repository::from_gtfs(&gtfs))
    {
        Ok(repository) => repository,
        Err(err) => {
            error!("Failed to load {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    info!(
        "Loading data took {:?} ({} stops, {} patterns, {} skipped records)",
        now.elapsed(),
        repository.stops.len(),
        repository.patterns.len(),
        repository.issues().len()
    );
    let state = Arc::new(AppState::new(path, repository));

    let app = axum::Router::new()
        .route("/routing", get(api::routing))
        .route("/near", get(api::near))
        .route("/stops/{id}", get(api::stop))
        .route("/gtfs/age", get(api::age))
        .route("/gtfs/reload", post(api::reload))
        .with_state(state);
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {port}: {err}");
            std::process::exit(1);
        }
    };
    info!("Listening to port {port}");
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server stopped: {err}");
    }
}
