use crate::errors::AppError;
use crate::http::API_KEY_HEADER;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_config::{ConfigError, FromEnv};
use std::sync::Arc;

/// Shared-secret configuration for routes behind `x-api-key`.
///
/// Loaded from `API_SECRET_KEY`. An unset or empty value is not a startup
/// error: protected routes answer 500 until it is configured.
#[derive(Clone, Debug, Default)]
pub struct ApiKeyConfig {
    secret: Option<Arc<str>>,
}

impl ApiKeyConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            secret: (!secret.is_empty()).then(|| Arc::from(secret)),
        }
    }

    /// No key configured: every protected request fails with 500.
    pub fn unconfigured() -> Self {
        Self { secret: None }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks a presented key against the configured one.
    pub fn verify(&self, presented: Option<&str>) -> Result<(), AppError> {
        let Some(expected) = self.secret.as_deref() else {
            return Err(AppError::Configuration(
                "API_SECRET_KEY is not set".to_string(),
            ));
        };

        match presented {
            None | Some("") => Err(AppError::Unauthorized("API key is required".to_string())),
            Some(key) if key == expected => Ok(()),
            Some(_) => Err(AppError::Unauthorized("Invalid API key".to_string())),
        }
    }
}

impl FromEnv for ApiKeyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("API_SECRET_KEY") {
            Ok(secret) => Ok(Self::new(secret)),
            Err(_) => {
                tracing::warn!("API_SECRET_KEY is not set; protected routes will reject requests");
                Ok(Self::unconfigured())
            }
        }
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// API key middleware.
///
/// ```ignore
/// use axum_helpers::auth::{ApiKeyConfig, require_api_key};
///
/// let protected = Router::new()
///     .route("/submitSpecialEvent", post(handler))
///     .layer(axum::middleware::from_fn_with_state(config, require_api_key));
/// ```
pub async fn require_api_key(
    State(config): State<ApiKeyConfig>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = config.verify(extract_api_key(request.headers())) {
        return e.into_response();
    }

    next.run(request).await
}
