use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::yield_records::{CreateYieldRecord, UpdateYieldRecord},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_yield_records(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let yield_records = state.services.yield_records.list_yield_records(&caller).await?;
    Ok(success_response(yield_records))
}

async fn create_yield_record(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateYieldRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.yield_records.create_yield_record(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_yield_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.yield_records.get_yield_record(&caller, id).await?;
    Ok(success_response(found))
}

async fn update_yield_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateYieldRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .yield_records
        .update_yield_record(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_yield_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.yield_records.delete_yield_record(&caller, id).await?;
    Ok(no_content_response())
}

pub fn yield_record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_yield_records).post(create_yield_record))
        .route(
            "/:id",
            get(get_yield_record)
                .put(update_yield_record)
                .patch(update_yield_record)
                .delete(delete_yield_record),
        )
}
