//! Readiness endpoint

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use domain_events::{EventLookup, EventService, EventStore};

/// Create the readiness router
pub fn router<S, L>(service: EventService<S, L>) -> Router
where
    S: EventStore + 'static,
    L: EventLookup + 'static,
{
    Router::new()
        .route("/ready", get(readiness_check::<S, L>))
        .with_state(service)
}

/// Readiness check - verifies the event store answers
async fn readiness_check<S: EventStore, L: EventLookup>(
    State(service): State<EventService<S, L>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "eventStore",
        Box::pin(async { service.health().await.map_err(|e| e.to_string()) }),
    )];

    match run_health_checks(checks).await {
        Ok(ready) => ready.into_response(),
        Err(not_ready) => not_ready.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_events::{GraphqlEventLookup, InMemoryEventStore, LookupConfig};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ready_with_in_memory_store() {
        let lookup = GraphqlEventLookup::new(LookupConfig::default()).unwrap();
        let app = router(EventService::new(InMemoryEventStore::new(), lookup));

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "eventStore": "connected", "status": "ready" }));
    }
}
