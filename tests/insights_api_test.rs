//! Monthly chart endpoints.

mod common;

use axum::http::StatusCode;
use chrono::{Days, Utc};
use common::TestApp;
use serde_json::{json, Value};

fn today() -> String {
    Utc::now().date_naive().to_string()
}

fn last(series: &Value) -> &Value {
    series
        .as_array()
        .and_then(|values| values.last())
        .expect("non-empty series")
}

#[tokio::test]
async fn chart_requests_need_a_livestock_id() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;

    for uri in [
        "/api/amu-insights/chart-data",
        "/api/feed-insights/chart-data",
        "/api/yield-insights/chart-data",
    ] {
        for query in ["", "?livestock_id=", "?livestock_id=&yield_type=Milk"] {
            let res = app.get(&format!("{uri}{query}"), &owner).await;
            assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}{query}");
            assert_eq!(res.body["message"], "Livestock ID is required");
        }

        let res = app.get(&format!("{uri}?livestock_id=abc"), &owner).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "Invalid livestock ID \"abc\"");
    }
}

#[tokio::test]
async fn charts_are_scoped_to_the_callers_farm() {
    let app = TestApp::new().await;
    let (amina, farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let (bayo, _) = app.owner("bayo", "Mountain Cattle Ranch").await;
    let cow = app.livestock(&amina, "COW-001").await;
    let (pending, _) = app.pending_labourer("sarah_worker", farm).await;
    let approved = app.approved_labourer("john_worker", farm, &amina).await;

    let uri = format!("/api/feed-insights/chart-data?livestock_id={cow}");

    let res = app.get(&uri, &bayo).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], format!("Livestock with ID {cow} not found"));

    let res = app.get(&uri, &pending).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&uri, &approved).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn empty_history_yields_thirteen_zero_buckets() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;

    let res = app
        .get(&format!("/api/amu-insights/chart-data?livestock_id={cow}"), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["chart_data"]["labels"].as_array().map(Vec::len), Some(13));
    assert_eq!(res.body["chart_data"]["datasets"], json!([]));
    assert_eq!(res.body["summary"]["total_treatments"], 0);
    assert_eq!(res.body["summary"]["unique_drugs"], 0);

    let res = app
        .get(&format!("/api/feed-insights/chart-data?livestock_id={cow}"), &owner)
        .await;
    let spend = &res.body["spend_chart"]["datasets"][0];
    assert_eq!(spend["label"], "Total Spend (₦)");
    assert_eq!(spend["data"].as_array().map(Vec::len), Some(13));
    assert_eq!(res.body["summary"]["total_spend"], 0.0);
}

#[tokio::test]
async fn feed_spend_lands_in_the_current_month() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;

    let feed = app
        .post(
            "/api/feeds",
            json!({ "name": "Dairy Meal", "cost_per_kg": 50 }),
            &owner,
        )
        .await;
    let feed_id = feed.body["id"].as_i64().expect("feed id");

    for body in [
        json!({
            "livestock": cow, "feed_type": "Dairy Meal", "feed": feed_id,
            "quantity_kg": 10, "price_per_kg": 19, "date": today()
        }),
        // No explicit price: the catalog cost applies.
        json!({
            "livestock": cow, "feed_type": "Dairy Meal", "feed": feed_id,
            "quantity_kg": 2, "date": today()
        }),
        // Outside the window.
        json!({
            "livestock": cow, "feed_type": "Hay",
            "quantity_kg": 100, "price_per_kg": 15, "date": "2001-01-01"
        }),
    ] {
        let res = app.post("/api/feed-records", body, &owner).await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    let res = app
        .get(&format!("/api/feed-insights/chart-data?livestock_id={cow}"), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let spend = &res.body["spend_chart"]["datasets"][0]["data"];
    assert_eq!(last(spend), &json!(290.0));
    assert_eq!(res.body["summary"]["total_spend"], 290.0);

    let breakdown = res.body["breakdown_chart"]["datasets"]
        .as_array()
        .expect("breakdown datasets");
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0]["stack"], "feed");
    assert_eq!(last(&breakdown[0]["data"]), &json!(290.0));
}

#[tokio::test]
async fn amu_chart_counts_treatments_per_drug() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;

    let drug = app
        .post("/api/drugs", json!({ "name": "Oxytetracycline 20%", "unit": "ml" }), &owner)
        .await;
    let drug_id = drug.body["id"].as_i64().expect("drug id");

    let recent = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap_or_else(|| Utc::now().date_naive())
        .to_string();
    for event_date in [today(), recent] {
        let record = app
            .post(
                "/api/health-records",
                json!({ "livestock": cow, "event_type": "treatment", "event_date": event_date }),
                &owner,
            )
            .await;
        let record_id = record.body["id"].as_i64().expect("health record id");
        let res = app
            .post(
                "/api/amu-records",
                json!({
                    "health_record": record_id,
                    "drug": drug_id,
                    "dosage": "7.5 ml",
                    "withdrawal_period": 7
                }),
                &owner,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    let res = app
        .get(&format!("/api/amu-insights/chart-data?livestock_id={cow}"), &owner)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["summary"]["total_treatments"], 2);
    assert_eq!(res.body["summary"]["unique_drugs"], 1);

    let datasets = res.body["chart_data"]["datasets"].as_array().expect("datasets");
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0]["label"], "Oxytetracycline 20%");
    assert_eq!(datasets[0]["borderWidth"], 1);
    let total: u64 = datasets[0]["data"]
        .as_array()
        .expect("data")
        .iter()
        .filter_map(Value::as_u64)
        .sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn yield_chart_filters_by_type() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;

    for (yield_type, quantity, unit) in [("Milk", 20.5, "liters"), ("Milk", 4.5, "liters"), ("Meat", 3.0, "kg")] {
        let res = app
            .post(
                "/api/yield-records",
                json!({
                    "livestock": cow, "yield_type": yield_type,
                    "quantity": quantity, "unit": unit, "date": today()
                }),
                &owner,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    let res = app
        .get(&format!("/api/yield-insights/chart-data?livestock_id={cow}"), &owner)
        .await;
    assert_eq!(res.body["summary"]["types"], json!(["Meat", "Milk"]));
    assert_eq!(res.body["datasets"].as_array().map(Vec::len), Some(2));

    let res = app
        .get(
            &format!("/api/yield-insights/chart-data?livestock_id={cow}&yield_type=Milk"),
            &owner,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let datasets = res.body["datasets"].as_array().expect("datasets");
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0]["label"], "Milk (liters)");
    assert_eq!(last(&datasets[0]["data"]), &json!(25.0));
    assert_eq!(res.body["summary"]["total_yield"], 25.0);
}
