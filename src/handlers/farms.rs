use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::farms::{CreateFarm, UpdateFarm},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Every farm; any signed-in user may browse them before joining one.
async fn list_farms(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let farms = state.services.farms.list_farms().await?;
    Ok(success_response(farms))
}

async fn create_farm(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateFarm>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let farm = state.services.farms.create_farm(&caller, payload).await?;
    Ok(created_response(farm))
}

async fn get_farm(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let farm = state.services.farms.get_farm(&caller, id).await?;
    Ok(success_response(farm))
}

async fn update_farm(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFarm>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let farm = state.services.farms.update_farm(&caller, id, payload).await?;
    Ok(success_response(farm))
}

async fn delete_farm(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.farms.delete_farm(&caller, id).await?;
    Ok(no_content_response())
}

pub fn farm_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_farms).post(create_farm))
        .route(
            "/:id",
            get(get_farm)
                .put(update_farm)
                .patch(update_farm)
                .delete(delete_farm),
        )
}
