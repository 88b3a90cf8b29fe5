use super::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    auth::Caller,
    errors::ApiError,
    handlers::AppState,
    services::drugs::{CreateDrug, UpdateDrug},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

// Catalog reads are open to every signed-in user; writes are owner-only.

async fn list_drugs(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let drugs = state.services.drugs.list_drugs().await?;
    Ok(success_response(drugs))
}

async fn create_drug(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateDrug>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state.services.drugs.create_drug(&caller, payload).await?;
    Ok(created_response(created))
}

async fn get_drug(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.services.drugs.get_drug(id).await?;
    Ok(success_response(found))
}

async fn update_drug(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDrug>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .drugs
        .update_drug(&caller, id, payload)
        .await?;
    Ok(success_response(updated))
}

async fn delete_drug(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.drugs.delete_drug(&caller, id).await?;
    Ok(no_content_response())
}

pub fn drug_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drugs).post(create_drug))
        .route(
            "/:id",
            get(get_drug)
                .put(update_drug)
                .patch(update_drug)
                .delete(delete_drug),
        )
}
