//! Shared-secret authentication for protected routes.
//!
//! ```ignore
//! use axum_helpers::auth::{ApiKeyConfig, require_api_key};
//! use core_config::FromEnv;
//!
//! let config = ApiKeyConfig::from_env()?;
//! let protected = Router::new()
//!     .route("/api/protected", post(handler))
//!     .layer(axum::middleware::from_fn_with_state(config, require_api_key));
//! ```

pub mod api_key;

pub use api_key::{ApiKeyConfig, require_api_key};
