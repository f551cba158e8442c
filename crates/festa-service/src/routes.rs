//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    awards, health, leaderboard, participants, ratings, trending, venues, visits,
};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Registration (station API key)
/// - `POST /v1/participants` - Register a participant
/// - `GET /v1/participants/:id` - Get a participant
/// - `POST /v1/venues` - Register a venue
/// - `GET /v1/venues` - List venues
///
/// ## Scans (station API key)
/// - `POST /v1/visits` - Record a visit scan
/// - `POST /v1/awards` - Grant award points
///
/// ## Ratings (station API key for writes)
/// - `POST /v1/venues/:venue_id/ratings` - Create a rating
/// - `PUT /v1/venues/:venue_id/ratings` - Update a rating
/// - `GET /v1/ratings/stats` - Aggregate `(average, count)` per venue
///
/// ## Rankings (read-only, polled)
/// - `GET /v1/leaderboard` - Dense-ranked point standings
/// - `GET /v1/trending` - Recency-weighted trending venues
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Registration
        .route("/v1/participants", post(participants::create_participant))
        .route("/v1/participants/:id", get(participants::get_participant))
        .route("/v1/venues", post(venues::create_venue))
        .route("/v1/venues", get(venues::list_venues))
        // Scans
        .route("/v1/visits", post(visits::record_visit))
        .route("/v1/awards", post(awards::award_points))
        // Ratings
        .route("/v1/venues/:venue_id/ratings", post(ratings::create_rating))
        .route("/v1/venues/:venue_id/ratings", put(ratings::update_rating))
        .route("/v1/ratings/stats", get(ratings::rating_stats))
        // Rankings
        .route("/v1/leaderboard", get(leaderboard::compute_leaderboard))
        .route("/v1/trending", get(trending::compute_trending))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
