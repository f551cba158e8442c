//! Service configuration.

use festa_core::FestivalConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/festa").
    pub data_dir: String,

    /// Station API key for scan-station requests. When unset, mutating
    /// routes accept unauthenticated requests (development mode).
    pub station_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Engine tuning: award value, throttle/edit windows, trending weights.
    pub festival: FestivalConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = FestivalConfig::default();
        let festival = FestivalConfig {
            award_points: env_parse("AWARD_POINTS", defaults.award_points),
            throttle_window_minutes: env_parse(
                "THROTTLE_WINDOW_MINUTES",
                defaults.throttle_window_minutes,
            ),
            rating_edit_window_ms: env_parse(
                "RATING_EDIT_WINDOW_MS",
                defaults.rating_edit_window_ms,
            ),
            trending_window_minutes: env_parse(
                "TRENDING_WINDOW_MINUTES",
                defaults.trending_window_minutes,
            ),
            trending_limit: env_parse("TRENDING_LIMIT", defaults.trending_limit),
            rating_weight: env_parse("RATING_WEIGHT", defaults.rating_weight),
            smoothing_weight: env_parse("SMOOTHING_WEIGHT", defaults.smoothing_weight),
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/festa".into()),
            station_api_key: std::env::var("STATION_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES", 1024 * 1024), // 1MB
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS", 30),
            festival,
        }
    }
}

/// Parse an environment variable, falling back to the default.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/festa".into(),
            station_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            festival: FestivalConfig::default(),
        }
    }
}
