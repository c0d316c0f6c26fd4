//! HTTP middleware module.
//!
//! - CORS configuration
//! - Security headers
//!
//! ```ignore
//! use axum_helpers::http::{CorsOrigins, create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&CorsOrigins::Any));
//! ```

pub mod cors;
pub mod security;

pub use cors::{API_KEY_HEADER, CorsOrigins, create_cors_layer};
pub use security::security_headers;
