use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::health_records::{CreateHealthRecord, UpdateHealthRecord},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_health_records(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let health_records = state.services.health_records.list_health_records(&caller).await?;
    Ok(success_response(health_records))
}

async fn create_health_record(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateHealthRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.health_records.create_health_record(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_health_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.health_records.get_health_record(&caller, id).await?;
    Ok(success_response(found))
}

async fn update_health_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateHealthRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .health_records
        .update_health_record(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_health_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.health_records.delete_health_record(&caller, id).await?;
    Ok(no_content_response())
}

pub fn health_record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_health_records).post(create_health_record))
        .route(
            "/:id",
            get(get_health_record)
                .put(update_health_record)
                .patch(update_health_record)
                .delete(delete_health_record),
        )
}
