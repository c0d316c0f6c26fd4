//! Events API routes

use axum::Router;
use axum_helpers::ApiKeyConfig;
use domain_events::{EventLookup, EventService, EventStore};
use tracing::{info, warn};

/// Create the events router over whichever store the binary was started with
pub fn router<S, L>(service: EventService<S, L>, api_key: ApiKeyConfig) -> Router
where
    S: EventStore + 'static,
    L: EventLookup + 'static,
{
    if api_key.is_configured() {
        info!("Special event submission enabled");
    } else {
        warn!("API_SECRET_KEY not set: /api/submitSpecialEvent will answer 500");
    }

    // Use the domain's router
    domain_events::router(service, api_key)
}
