use crate::{api::parse_coordinate, dto::RoutingDto, state::AppState};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, error};
use transitnav::{prelude::*, raptor};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

/// `/routing?from=lat,lon&to=lat,lon[&time=HH:MM:SS][&date=YYYYMMDD][&all=true]`
pub async fn routing(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let from = parse_coordinate(params.get("from").ok_or(StatusCode::BAD_REQUEST)?)?;
    let to = parse_coordinate(params.get("to").ok_or(StatusCode::BAD_REQUEST)?)?;
    let time = match params.get("time") {
        Some(value) => Time::from_hms(value).ok_or(StatusCode::BAD_REQUEST)?,
        None => Time::now(),
    };
    let date = match params.get("date") {
        Some(value) => ServiceDate::parse(value).ok_or(StatusCode::BAD_REQUEST)?,
        None => ServiceDate::today(),
    };
    let all = params.get("all").is_some_and(|value| value == "true");
    debug!("Routing from {from} to {to} at {time} on {date}");

    let repository = state.repository().await;
    let result = tokio::task::spawn_blocking(move || {
        let outcome = repository
            .router(from, to)
            .departure_at(Departure::new(time, date))
            .timeout(SEARCH_TIMEOUT)
            .search()?;
        RoutingDto::from(outcome, all)
    })
    .await
    .map_err(|err| {
        error!("Routing task failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match result {
        Ok(dto) => Ok(Json(dto).into_response()),
        Err(raptor::Error::Cancelled | raptor::Error::DeadlineExceeded) => {
            Err(StatusCode::GATEWAY_TIMEOUT)
        }
        Err(err) => {
            error!("Routing failed: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
