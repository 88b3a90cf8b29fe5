use super::common::success_response;
use crate::{auth::Caller, errors::ApiError, handlers::AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// The authenticated user with their owned farm and labourer profile.
async fn me(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse, ApiError> {
    let profile = state.services.users.profile(&caller).await?;
    Ok(success_response(profile))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
