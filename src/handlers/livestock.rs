use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::livestock::{CreateLivestock, UpdateLivestock},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_livestock(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let livestock = state.services.livestock.list_livestock(&caller).await?;
    Ok(success_response(livestock))
}

async fn create_livestock(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateLivestock>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.livestock.create_livestock(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_livestock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.livestock.get_livestock(&caller, id).await?;
    Ok(success_response(found))
}

/// PUT and PATCH both apply a partial update.
async fn update_livestock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLivestock>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .livestock
        .update_livestock(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_livestock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.livestock.delete_livestock(&caller, id).await?;
    Ok(no_content_response())
}

pub fn livestock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_livestock).post(create_livestock))
        .route(
            "/:id",
            get(get_livestock)
                .put(update_livestock)
                .patch(update_livestock)
                .delete(delete_livestock),
        )
}
