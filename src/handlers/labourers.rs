use super::common::{created_response, no_content_response, success_response};
use crate::{auth::Caller, errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

async fn list_labourers(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let labourers = state.services.labourers.list_labourers(&caller).await?;
    Ok(success_response(labourers))
}

/// Registers the caller as an unassigned labourer. Request bodies are ignored.
async fn create_labourer(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let labourer = state.services.labourers.create_labourer(&caller).await?;
    Ok(created_response(labourer))
}

async fn get_labourer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let labourer = state.services.labourers.get_labourer(&caller, id).await?;
    Ok(success_response(labourer))
}

async fn delete_labourer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.labourers.delete_labourer(&caller, id).await?;
    Ok(no_content_response())
}

/// `id` is the farm being joined.
async fn join_farm(
    State(state): State<AppState>,
    caller: Caller,
    Path(farm_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.services.labourers.join_farm(&caller, farm_id).await?;
    Ok(success_response(detail))
}

async fn approve_labourer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.services.labourers.approve_labourer(&caller, id).await?;
    Ok(success_response(detail))
}

async fn reject_labourer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.services.labourers.reject_labourer(&caller, id).await?;
    Ok(success_response(detail))
}

pub fn labourer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_labourers).post(create_labourer))
        .route("/:id", get(get_labourer).delete(delete_labourer))
        .route("/:id/join-farm", post(join_farm))
        .route("/:id/approve", post(approve_labourer))
        .route("/:id/reject", post(reject_labourer))
}
