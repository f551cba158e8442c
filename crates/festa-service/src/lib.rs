//! Festa HTTP API Service.
//!
//! This crate provides the HTTP surface for the festa attendance ledger:
//!
//! - Participant and venue registration (per-station seeding)
//! - Visit recording and point awards
//! - Rating creation, updates, and aggregates
//! - Leaderboard and trending views (read-only, polled)
//!
//! # Authentication
//!
//! Scan stations authenticate with a shared API key (`x-api-key` header).
//! When no key is configured the service runs open for development.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
