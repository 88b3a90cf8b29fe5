use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::feeds::{CreateFeed, UpdateFeed},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_feeds(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let feeds = state.services.feeds.list_feeds().await?;
    Ok(success_response(feeds))
}

async fn create_feed(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateFeed>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.feeds.create_feed(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_feed(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.feeds.get_feed(id).await?;
    Ok(success_response(found))
}

async fn update_feed(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFeed>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .feeds
        .update_feed(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_feed(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.feeds.delete_feed(&caller, id).await?;
    Ok(no_content_response())
}

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feeds).post(create_feed))
        .route(
            "/:id",
            get(get_feed)
                .put(update_feed)
                .patch(update_feed)
                .delete(delete_feed),
        )
}
