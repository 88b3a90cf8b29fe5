//! Insight generation and voice parsing against a mock generative-language API.

mod common;

use axum::http::StatusCode;
use common::{candidate, TestApp};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path, query_param},
    Mock, ResponseTemplate,
};

const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

/// Owner with one treated cow; returns the owner token and livestock id.
async fn treated_cow(app: &TestApp) -> (String, i64) {
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;

    let drug = app
        .post(
            "/api/drugs",
            json!({ "name": "Penicillin G", "active_ingredient": "Benzylpenicillin", "unit": "ml" }),
            &owner,
        )
        .await;
    let record = app
        .post(
            "/api/health-records",
            json!({
                "livestock": cow,
                "event_type": "sickness",
                "event_date": "2024-04-02",
                "diagnosis": "Mastitis"
            }),
            &owner,
        )
        .await;
    let res = app
        .post(
            "/api/amu-records",
            json!({
                "health_record": record.body["id"],
                "drug": drug.body["id"],
                "dosage": "4.0 ml",
                "withdrawal_period": 3
            }),
            &owner,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    (owner, cow)
}

#[tokio::test]
async fn insights_embed_the_animal_history() {
    let app = TestApp::new().await;
    let (owner, cow) = treated_cow(&app).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("Holstein Friesian"))
        .and(body_string_contains("Mastitis"))
        .and(body_string_contains("Penicillin G"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Limit penicillin use.")))
        .expect(1)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/generate", json!({ "livestock_id": cow }), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "insights": "Limit penicillin use." }));
}

#[tokio::test]
async fn insights_retry_after_an_upstream_failure() {
    let app = TestApp::new().await;
    let (owner, cow) = treated_cow(&app).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.ai)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Second time lucky.")))
        .expect(1)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/generate", json!({ "livestock_id": cow }), &owner)
        .await;
    assert_eq!(res.body["insights"], "Second time lucky.");
}

#[tokio::test]
async fn exhausted_insight_attempts_report_the_first_error() {
    let app = TestApp::new().await;
    let (owner, cow) = treated_cow(&app).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/generate", json!({ "livestock_id": cow }), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["insights"], "Error generating insights: 500 - boom");
}

#[tokio::test]
async fn empty_candidates_produce_a_placeholder() {
    let app = TestApp::new().await;
    let (owner, cow) = treated_cow(&app).await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/generate", json!({ "livestock_id": cow }), &owner)
        .await;
    assert_eq!(res.body["insights"], "AI generated an empty response.");
}

#[tokio::test]
async fn insights_are_owner_only() {
    let app = TestApp::new().await;
    let (owner, cow) = treated_cow(&app).await;
    let farm = app.get("/api/users/me", &owner).await.body["owned_farm"]["id"].clone();
    let worker = app
        .approved_labourer("john_worker", farm.as_i64().expect("farm id"), &owner)
        .await;

    let res = app
        .post("/api/amu-insights/generate", json!({ "livestock_id": cow }), &worker)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Livestock not found or you don't own it.");

    let res = app.post("/api/amu-insights/generate", json!({}), &owner).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "livestock_id is required.");
}

#[tokio::test]
async fn voice_transcripts_come_back_as_form_fields() {
    let app = TestApp::new().await;
    let owner = app.user("amina").await;

    let fenced = "```json\n{\"tag_id\": \"COW-009\", \"species\": \"Cattle\", \"gender\": \"F\"}\n```";
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("responseMimeType"))
        .and(body_string_contains("new heifer tag cow nine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(fenced)))
        .expect(1)
        .mount(&app.ai)
        .await;

    let res = app
        .post(
            "/api/amu-insights/parse-voice",
            json!({ "transcript": "new heifer tag cow nine", "form_type": "livestock" }),
            &owner,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        json!({ "tag_id": "COW-009", "species": "Cattle", "gender": "F" })
    );
}

#[tokio::test]
async fn voice_parsing_reports_empty_answers() {
    let app = TestApp::new().await;
    let owner = app.user("amina").await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .expect(1)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/parse-voice", json!({ "transcript": "hello" }), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "error": "AI returned empty response" }));
}

#[tokio::test]
async fn voice_parsing_reports_the_last_failure() {
    let app = TestApp::new().await;
    let owner = app.user("amina").await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("no json here")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&app.ai)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .expect(1)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/parse-voice", json!({ "transcript": "hello" }), &owner)
        .await;
    assert_eq!(res.body, json!({ "error": "API error: 400 - API key not valid" }));
}

#[tokio::test]
async fn unparseable_output_is_retried_then_reported() {
    let app = TestApp::new().await;
    let owner = app.user("amina").await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("I could not tell.")))
        .expect(3)
        .mount(&app.ai)
        .await;

    let res = app
        .post("/api/amu-insights/parse-voice", json!({ "transcript": "hello" }), &owner)
        .await;
    assert_eq!(res.body, json!({ "error": "Could not parse AI response as JSON" }));
}

#[tokio::test]
async fn voice_parsing_needs_a_transcript() {
    let app = TestApp::new().await;
    let owner = app.user("amina").await;

    let res = app
        .post("/api/amu-insights/parse-voice", json!({ "transcript": "" }), &owner)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Transcript is required");
}
