use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Header carrying the shared secret for protected routes.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Allowed origins for cross-origin requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    /// `*`: any origin, no credentials
    Any,
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parses a comma-separated list (`CORS_ALLOWED_ORIGIN` format).
    ///
    /// `*` or an empty value means any origin.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::Any);
        }

        let origins = trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| format!("Invalid CORS origin '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::List(origins))
    }
}

/// Creates the CORS layer for the API.
///
/// - Methods: GET, POST, PATCH, OPTIONS
/// - Headers: Content-Type, Authorization, x-api-key
/// - 1 hour max age
pub fn create_cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => layer.allow_origin(AllowOrigin::list(list.clone())),
    }
}
