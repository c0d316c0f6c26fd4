//! API routes module
//!
//! `routes` is nested under `/api` by `axum_helpers::create_router`; the
//! readiness probe in [`health`] is mounted at the root next to `/health`.

pub mod events;
pub mod health;

use axum::Router;
use domain_events::{EventLookup, EventService, EventStore};

use crate::config::Config;

/// Create all API routes
pub fn routes<S, L>(service: &EventService<S, L>, config: &Config) -> Router
where
    S: EventStore + 'static,
    L: EventLookup + 'static,
{
    Router::new().merge(events::router(service.clone(), config.api_key.clone()))
}
