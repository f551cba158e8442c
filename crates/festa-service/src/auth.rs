//! Authentication extractors.
//!
//! Scan stations authenticate with a shared API key. The identity/SSO stack
//! lives outside this service; this is only the station-to-service check.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Station authentication via API key.
///
/// When no key is configured the service runs open (development mode) and
/// the extractor admits every request.
#[derive(Debug, Clone)]
pub struct StationAuth {
    /// The station name or identifier, if the station reported one.
    pub station_name: String,
}

impl FromRequestParts<Arc<AppState>> for StationAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let station_name = parts
                .headers
                .get("x-station-name")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            let Some(expected_key) = state.config.station_api_key.as_ref() else {
                return Ok(StationAuth { station_name });
            };

            let api_key = parts
                .headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            if api_key != expected_key {
                return Err(ApiError::Unauthorized);
            }

            Ok(StationAuth { station_name })
        })
    }
}
