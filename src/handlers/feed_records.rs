use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::feed_records::{CreateFeedRecord, UpdateFeedRecord},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_feed_records(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let feed_records = state.services.feed_records.list_feed_records(&caller).await?;
    Ok(success_response(feed_records))
}

async fn create_feed_record(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateFeedRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.feed_records.create_feed_record(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_feed_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.feed_records.get_feed_record(&caller, id).await?;
    Ok(success_response(found))
}

async fn update_feed_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFeedRecord>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .feed_records
        .update_feed_record(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_feed_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.feed_records.delete_feed_record(&caller, id).await?;
    Ok(no_content_response())
}

pub fn feed_record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feed_records).post(create_feed_record))
        .route(
            "/:id",
            get(get_feed_record)
                .put(update_feed_record)
                .patch(update_feed_record)
                .delete(delete_feed_record),
        )
}
