//! Rating lifecycle integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn seed_visited_pair(harness: &TestHarness) -> (String, String) {
    let participant_id = harness.seed_attendee("mika", 2, "p-tok-1").await;
    let venue_id = harness.seed_venue("Planetarium", "v-tok-1").await;
    harness
        .record_visit(&participant_id, "v-tok-1")
        .await
        .assert_status_ok();
    (venue_id, participant_id)
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn create_rating_success() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    let response = harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({
            "participant_id": participant_id,
            "score": 4.0,
            "review": "  solid show  ",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["score"], 4);
    assert_eq!(body["review"], "solid show");
}

#[tokio::test]
async fn score_is_rounded_then_range_checked() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    let response = harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 4.6 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["score"], 5);
}

#[tokio::test]
async fn out_of_range_score_rejected() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    for score in [0.4, 5.6, -1.0] {
        let response = harness
            .server
            .post(&format!("/v1/venues/{venue_id}/ratings"))
            .add_header("x-api-key", harness.station_api_key.clone())
            .json(&json!({ "participant_id": participant_id, "score": score }))
            .await;

        response.assert_status_bad_request();
    }
}

#[tokio::test]
async fn rating_without_visit_fails() {
    let harness = TestHarness::new();
    let participant_id = harness.seed_attendee("mika", 2, "p-tok-1").await;
    let venue_id = harness.seed_venue("Planetarium", "v-tok-1").await;

    let response = harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 4.0 }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn second_rating_conflicts() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 4.0 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 5.0 }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rating_conflict");
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn update_review_tri_state() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    harness
        .server
        .post(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({
            "participant_id": participant_id,
            "score": 3.0,
            "review": "original",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    // Omitted review: untouched.
    let kept = harness
        .server
        .put(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 4.0 }))
        .await;
    kept.assert_status_ok();
    let body: serde_json::Value = kept.json();
    assert_eq!(body["score"], 4);
    assert_eq!(body["review"], "original");

    // Provided text: trimmed replacement.
    let replaced = harness
        .server
        .put(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({
            "participant_id": participant_id,
            "score": 4.0,
            "review": "  ok  ",
        }))
        .await;
    replaced.assert_status_ok();
    let body: serde_json::Value = replaced.json();
    assert_eq!(body["review"], "ok");

    // Explicit null: cleared.
    let cleared = harness
        .server
        .put(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({
            "participant_id": participant_id,
            "score": 4.0,
            "review": null,
        }))
        .await;
    cleared.assert_status_ok();
    let body: serde_json::Value = cleared.json();
    assert!(body["review"].is_null());
}

#[tokio::test]
async fn update_without_existing_rating_fails() {
    let harness = TestHarness::new();
    let (venue_id, participant_id) = seed_visited_pair(&harness).await;

    let response = harness
        .server
        .put(&format!("/v1/venues/{venue_id}/ratings"))
        .add_header("x-api-key", harness.station_api_key.clone())
        .json(&json!({ "participant_id": participant_id, "score": 4.0 }))
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Aggregates
// ============================================================================

#[tokio::test]
async fn rating_stats_aggregate() {
    let harness = TestHarness::new();
    let venue_id = harness.seed_venue("Planetarium", "v-tok-1").await;

    for (i, score) in [5.0, 3.0].iter().enumerate() {
        let participant_id = harness
            .seed_attendee(&format!("p{i}"), 1, &format!("p-tok-{i}"))
            .await;
        harness
            .record_visit(&participant_id, "v-tok-1")
            .await
            .assert_status_ok();
        harness
            .server
            .post(&format!("/v1/venues/{venue_id}/ratings"))
            .add_header("x-api-key", harness.station_api_key.clone())
            .json(&json!({ "participant_id": participant_id, "score": score }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = harness.server.get("/v1/ratings/stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let stats = &body["stats"][&venue_id];
    assert_eq!(stats["count"], 2);
    assert!((stats["average"].as_f64().unwrap() - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn rating_stats_empty_filter_short_circuits() {
    let harness = TestHarness::new();
    harness.seed_venue("Planetarium", "v-tok-1").await;

    let response = harness.server.get("/v1/ratings/stats?venue_ids=").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["stats"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn rating_stats_rejects_malformed_filter() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/ratings/stats?venue_ids=not-a-uuid")
        .await;

    response.assert_status_bad_request();
}
