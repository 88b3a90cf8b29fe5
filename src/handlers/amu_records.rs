use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::amu_records::{CreateAmuRecord, UpdateAmuRecord},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_amu_records(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let amu_records = state.services.amu_records.list_amu_records(&caller).await?;
    Ok(success_response(amu_records))
}

async fn create_amu_record(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateAmuRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.amu_records.create_amu_record(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_amu_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.amu_records.get_amu_record(&caller, id).await?;
    Ok(success_response(found))
}

async fn update_amu_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAmuRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .amu_records
        .update_amu_record(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_amu_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.amu_records.delete_amu_record(&caller, id).await?;
    Ok(no_content_response())
}

pub fn amu_record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_amu_records).post(create_amu_record))
        .route(
            "/:id",
            get(get_amu_record)
                .put(update_amu_record)
                .patch(update_amu_record)
                .delete(delete_amu_record),
        )
}
