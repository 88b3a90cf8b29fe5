use super::common::success_response;
use crate::{
    auth::Caller,
    errors::{ApiError, ServiceError},
    handlers::AppState,
    services::ai::{GenerateInsightsRequest, ParseVoiceRequest},
};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

/// Raw query; `livestock_id` stays text so a blank or malformed value gets
/// the JSON error body rather than the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub livestock_id: Option<String>,
    pub yield_type: Option<String>,
}

impl ChartQuery {
    fn livestock_id(&self) -> Result<i32, ApiError> {
        let raw = self
            .livestock_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("Livestock ID is required".to_string()))?;
        raw.parse::<i32>().map_err(|_| {
            ServiceError::BadRequest(format!("Invalid livestock ID \"{raw}\"")).into()
        })
    }
}

async fn amu_chart_data(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chart = state
        .services
        .insights
        .amu_chart(&caller, query.livestock_id()?)
        .await?;
    Ok(success_response(chart))
}

async fn feed_chart_data(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chart = state
        .services
        .insights
        .feed_chart(&caller, query.livestock_id()?)
        .await?;
    Ok(success_response(chart))
}

async fn yield_chart_data(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let livestock_id = query.livestock_id()?;
    let yield_type = query.yield_type.as_deref().filter(|t| !t.is_empty());
    let chart = state
        .services
        .insights
        .yield_chart(&caller, livestock_id, yield_type)
        .await?;
    Ok(success_response(chart))
}

async fn generate_insights(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<GenerateInsightsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let insights = state.services.ai.generate_insights(&caller, payload).await?;
    Ok(success_response(insights))
}

/// Always 200 once a transcript is present; upstream failures come back as
/// `{"error": ...}`.
async fn parse_voice(
    State(state): State<AppState>,
    _caller: Caller,
    Json(payload): Json<ParseVoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let parsed = state.services.ai.parse_voice(payload).await?;
    Ok(success_response(parsed))
}

pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/amu-insights/chart-data", get(amu_chart_data))
        .route("/amu-insights/generate", post(generate_insights))
        .route("/amu-insights/parse-voice", post(parse_voice))
        .route("/feed-insights/chart-data", get(feed_chart_data))
        .route("/yield-insights/chart-data", get(yield_chart_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    fn query(livestock_id: Option<&str>) -> ChartQuery {
        ChartQuery {
            livestock_id: livestock_id.map(str::to_string),
            yield_type: None,
        }
    }

    #[test_case(None ; "absent")]
    #[test_case(Some("") ; "empty")]
    #[test_case(Some("  ") ; "blank")]
    fn missing_livestock_id_is_required(raw: Option<&str>) {
        assert_matches!(
            query(raw).livestock_id(),
            Err(ApiError::Service(ServiceError::BadRequest(msg))) if msg == "Livestock ID is required"
        );
    }

    #[test]
    fn livestock_id_must_be_numeric() {
        assert_matches!(
            query(Some("abc")).livestock_id(),
            Err(ApiError::Service(ServiceError::BadRequest(msg))) if msg == "Invalid livestock ID \"abc\""
        );
        assert_matches!(query(Some(" 42 ")).livestock_id(), Ok(42));
    }
}
