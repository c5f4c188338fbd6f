use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{fs, path::Path, sync::Arc, time::Instant};
use tracing::{error, info};
use transitnav::prelude::*;

/// Seconds since the feed on disk was last modified.
pub async fn age(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    if state.gtfs_data_path.exists() {
        let last_modifed = seconds_since_modified(&state.gtfs_data_path)?;
        Ok(last_modifed.to_string().into_response())
    } else {
        Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn seconds_since_modified<P: AsRef<Path>>(path: P) -> Result<u64, StatusCode> {
    let meta_data = fs::metadata(path).map_err(|err| {
        error!("Failed to get metadata: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let modified = meta_data.modified().map_err(|err| {
        error!("Failed to get modified: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let duration = modified.elapsed().map_err(|err| {
        error!("Failed to elapsed time since modified: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(duration.as_secs())
}

/// Rebuilds the repository from the feed on disk and swaps it in.
/// Queries already running keep the snapshot they started with.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let path = state.gtfs_data_path.clone();
    let now = Instant::now();
    let repository = tokio::task::spawn_blocking(move || {
        let gtfs = GtfsReader::new().from_zip(&path)?;
        Repository::from_gtfs(&gtfs)
    })
    .await
    .map_err(|err| {
        error!("Reload task failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|err| {
        error!("Failed to load gtfs file: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    info!("Reloading data took {:?}", now.elapsed());

    *state.repository.write().await = Arc::new(repository);
    Ok(().into_response())
}
