//! Farm scoping and role checks over the REST surface.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/api/livestock", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .request(Method::GET, "/api/livestock", None, Some("not-a-jwt"))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "up");

    let res = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["database"], "up");
}

#[tokio::test]
async fn guests_see_farms_but_no_records() {
    let app = TestApp::new().await;
    let (owner, _farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    app.livestock(&owner, "COW-001").await;

    let guest = app.user("visitor").await;

    let farms = app.get("/api/farms", &guest).await;
    assert_eq!(farms.status, StatusCode::OK);
    assert_eq!(farms.body.as_array().map(Vec::len), Some(1));

    for uri in [
        "/api/livestock",
        "/api/health-records",
        "/api/amu-records",
        "/api/feed-records",
        "/api/yield-records",
        "/api/labourers",
    ] {
        let res = app.get(uri, &guest).await;
        assert_eq!(res.status, StatusCode::OK, "{uri}");
        assert_eq!(res.body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn owners_only_reach_their_own_farm() {
    let app = TestApp::new().await;
    let (amina, amina_farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let (bayo, bayo_farm) = app.owner("bayo", "Mountain Cattle Ranch").await;
    let cow = app.livestock(&amina, "COW-001").await;
    app.livestock(&bayo, "BEEF-001").await;

    let listed = app.get("/api/livestock", &amina).await;
    let tags: Vec<&str> = listed
        .body
        .as_array()
        .expect("livestock list")
        .iter()
        .filter_map(|animal| animal["tag_id"].as_str())
        .collect();
    assert_eq!(tags, vec!["COW-001"]);

    let res = app.get(&format!("/api/livestock/{cow}"), &bayo).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&format!("/api/farms/{amina_farm}"), &bayo).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.get(&format!("/api/farms/{bayo_farm}"), &bayo).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Mountain Cattle Ranch");
}

#[tokio::test]
async fn second_farm_is_a_conflict() {
    let app = TestApp::new().await;
    let (owner, _farm) = app.owner("amina", "Green Pastures Dairy Farm").await;

    let res = app.post("/api/farms", json!({ "name": "Second Farm" }), &owner).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["message"], "You already own a farm.");
}

#[tokio::test]
async fn records_cannot_point_at_livestock_outside_the_farm() {
    let app = TestApp::new().await;
    let (amina, _) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let (bayo, _) = app.owner("bayo", "Mountain Cattle Ranch").await;
    let foreign_cow = app.livestock(&bayo, "BEEF-001").await;

    let res = app
        .post(
            "/api/health-records",
            json!({
                "livestock": foreign_cow,
                "event_type": "check-up",
                "event_date": "2024-05-01"
            }),
            &amina,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["message"],
        format!("livestock: Invalid pk \"{foreign_cow}\" - object does not exist.")
    );
}

#[tokio::test]
async fn approved_labourers_write_feed_and_yield_records_only() {
    let app = TestApp::new().await;
    let (owner, farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;
    let worker = app.approved_labourer("john_worker", farm, &owner).await;

    let res = app.get("/api/livestock", &worker).await;
    assert_eq!(res.body.as_array().map(Vec::len), Some(1));

    let feed = app
        .post(
            "/api/feed-records",
            json!({
                "livestock": cow,
                "feed_type": "Dairy Meal",
                "quantity_kg": 12.5,
                "price_per_kg": 45,
                "date": "2024-05-01"
            }),
            &worker,
        )
        .await;
    assert_eq!(feed.status, StatusCode::CREATED, "{}", feed.body);

    let res = app
        .post(
            "/api/yield-records",
            json!({
                "livestock": cow,
                "yield_type": "Milk",
                "quantity": 21.4,
                "unit": "liters",
                "date": "2024-05-01"
            }),
            &worker,
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = app
        .post(
            "/api/health-records",
            json!({
                "livestock": cow,
                "event_type": "sickness",
                "event_date": "2024-05-01"
            }),
            &worker,
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let feed_id = feed.body["id"].as_i64().expect("feed record id");
    let res = app
        .request(
            Method::DELETE,
            &format!("/api/feed-records/{feed_id}"),
            None,
            Some(&worker),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .request(
            Method::DELETE,
            &format!("/api/feed-records/{feed_id}"),
            None,
            Some(&owner),
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn pending_labourers_see_and_write_nothing() {
    let app = TestApp::new().await;
    let (owner, farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let cow = app.livestock(&owner, "COW-001").await;
    let (worker, _) = app.pending_labourer("sarah_worker", farm).await;

    let res = app.get("/api/livestock", &worker).await;
    assert_eq!(res.body, json!([]));

    let res = app.get(&format!("/api/livestock/{cow}"), &worker).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .post(
            "/api/feed-records",
            json!({
                "livestock": cow,
                "feed_type": "Hay",
                "quantity_kg": 8,
                "date": "2024-05-01"
            }),
            &worker,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_is_shared_but_owner_maintained() {
    let app = TestApp::new().await;
    let (owner, farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    let worker = app.approved_labourer("john_worker", farm, &owner).await;

    let drug = json!({
        "name": "Penicillin G",
        "active_ingredient": "Benzylpenicillin",
        "species_target": "Cattle",
        "recommended_dosage_min": 2,
        "recommended_dosage_max": 5,
        "unit": "ml"
    });

    let res = app.post("/api/drugs", drug.clone(), &worker).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/api/drugs", drug, &owner).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = app.get("/api/drugs", &worker).await;
    assert_eq!(res.body.as_array().map(Vec::len), Some(1));
    assert_eq!(res.body[0]["name"], "Penicillin G");
}

#[tokio::test]
async fn deleting_a_farm_removes_its_livestock() {
    let app = TestApp::new().await;
    let (owner, farm) = app.owner("amina", "Green Pastures Dairy Farm").await;
    app.livestock(&owner, "COW-001").await;

    let res = app
        .request(Method::DELETE, &format!("/api/farms/{farm}"), None, Some(&owner))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get("/api/livestock", &owner).await;
    assert_eq!(res.body, json!([]));
}
