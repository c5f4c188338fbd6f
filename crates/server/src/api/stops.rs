use crate::{dto::StopDetailsDto, state::AppState};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn stop(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let repository = state.repository().await;
    let stop = repository.stop_by_id(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(StopDetailsDto::from(&repository, stop)).into_response())
}
