use crate::{api::parse_coordinate, dto::NearbyStopDto, state::AppState};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, sync::Arc};
use transitnav::prelude::*;

/// Stops within walking distance of `at`, closest first.
pub async fn near(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let at = parse_coordinate(params.get("at").ok_or(StatusCode::BAD_REQUEST)?)?;
    let distance: f64 = match params.get("distance") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => 500.0,
    };
    let repository = state.repository().await;
    let mut footpaths = repository.footpaths_from_coordinate(&at, Distance::from_meters(distance));
    footpaths.sort_by_key(|footpath| footpath.duration);
    let result: Vec<_> = footpaths
        .into_iter()
        .map(|footpath| NearbyStopDto::from(&repository, &footpath))
        .collect();
    Ok(Json(result).into_response())
}
