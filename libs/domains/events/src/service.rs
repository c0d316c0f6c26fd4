use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::enricher::EventLookup;
use crate::error::{EventError, EventResult};
use crate::models::{
    Event, EventQueryParams, EventType, SpecialEventRequest, SubmissionOutcome,
    SubmitEventRequest, UpdateEventRequest,
};
use crate::repository::EventStore;
use crate::validation::{
    INVALID_EVENT_TYPE, MISSING_REQUIRED_FIELDS, today_iso, validate_patch, validate_query,
    validate_special_event, validate_submission,
};

/// Service layer for event ingestion, queries and updates
pub struct EventService<S: EventStore, L: EventLookup> {
    store: Arc<S>,
    lookup: Arc<L>,
}

impl<S: EventStore, L: EventLookup> Clone for EventService<S, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<S: EventStore, L: EventLookup> EventService<S, L> {
    pub fn new(store: S, lookup: L) -> Self {
        Self {
            store: Arc::new(store),
            lookup: Arc::new(lookup),
        }
    }

    /// Validate, enrich from the source URL, then store unless already known.
    #[instrument(skip(self, request), fields(url = ?request.url, event_type = ?request.event_type))]
    pub async fn submit_event(&self, request: SubmitEventRequest) -> EventResult<SubmissionOutcome> {
        if let Some(message) = validate_submission(&request) {
            return Err(EventError::Validation(message));
        }

        let (Some(url), Some(event_type)) = (request.url, request.event_type) else {
            return Err(EventError::Validation(MISSING_REQUIRED_FIELDS.to_string()));
        };
        let event_type = EventType::parse_lenient(&event_type)
            .ok_or_else(|| EventError::Validation(INVALID_EVENT_TYPE.to_string()))?;

        let details = self
            .lookup
            .fetch_canonical_event(&url)
            .await?
            .ok_or_else(EventError::event_not_found)?;

        self.store_event(details.into_event(event_type)).await
    }

    /// Same as [`submit_event`](Self::submit_event) without enrichment: the
    /// caller supplies the whole event.
    #[instrument(skip(self, request), fields(event_id = ?request.event_id, event_type = ?request.event_type))]
    pub async fn submit_special_event(
        &self,
        request: SpecialEventRequest,
    ) -> EventResult<SubmissionOutcome> {
        if let Some(message) = validate_special_event(&request) {
            return Err(EventError::Validation(message));
        }

        let event_type = request
            .event_type
            .as_deref()
            .and_then(EventType::parse_lenient)
            .ok_or_else(|| EventError::Validation(INVALID_EVENT_TYPE.to_string()))?;

        self.store_event(request.into_event(event_type)).await
    }

    async fn store_event(&self, event: Event) -> EventResult<SubmissionOutcome> {
        let event_id = event.event_id.clone();
        let event_type = event.event_type;

        let result = self.store.insert(event).await?;
        let outcome = SubmissionOutcome::from_insert(result, event_id);

        match &outcome {
            SubmissionOutcome::Created { event_id } => {
                info!(%event_id, %event_type, "Event created")
            }
            SubmissionOutcome::AlreadyExists { event_id } => {
                info!(%event_id, %event_type, "Event already exists")
            }
        }

        Ok(outcome)
    }

    /// Events of one discipline on or after `startDate` (today when omitted).
    #[instrument(skip(self))]
    pub async fn events_by_type(&self, params: EventQueryParams) -> EventResult<Vec<Event>> {
        let start_date = params.start_date.unwrap_or_else(today_iso);

        if let Some(message) = validate_query(params.event_type.as_deref(), Some(&start_date)) {
            return Err(EventError::Validation(message));
        }

        let event_type = params
            .event_type
            .as_deref()
            .and_then(EventType::parse_lenient)
            .ok_or_else(|| EventError::Validation(INVALID_EVENT_TYPE.to_string()))?;

        self.store.query_by_type_since(event_type, &start_date).await
    }

    /// Partial update from a raw JSON object. Only the mutable fields present
    /// in `body` are written.
    #[instrument(skip(self, body), fields(event_id, event_type))]
    pub async fn update_event(&self, body: Map<String, Value>) -> EventResult<()> {
        let non_empty = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        };
        if !non_empty("eventId") || !non_empty("eventType") {
            return Err(EventError::Validation(
                "eventId and eventType are required".to_string(),
            ));
        }

        if let Some(message) = validate_patch(&body) {
            return Err(EventError::Validation(message));
        }

        let request: UpdateEventRequest = serde_json::from_value(Value::Object(body))
            .map_err(|e| EventError::Validation(e.to_string()))?;

        let event_type = EventType::parse_lenient(&request.event_type)
            .ok_or_else(|| EventError::Validation(INVALID_EVENT_TYPE.to_string()))?;

        let span = tracing::Span::current();
        span.record("event_id", request.event_id.as_str());
        span.record("event_type", tracing::field::display(event_type));

        self.store
            .merge(event_type, &request.event_id, request.patch)
            .await?;

        info!("Event updated");
        Ok(())
    }

    /// Store reachability, for readiness probes.
    pub async fn health(&self) -> EventResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enricher::MockEventLookup;
    use crate::models::{EventDetails, InsertResult};
    use crate::repository::MockEventStore;
    use crate::models::EventPatch;
    use mockall::predicate::{eq, function};
    use serde_json::json;

    fn details() -> EventDetails {
        EventDetails {
            event_id: "42".to_string(),
            name: "Spring Classic".to_string(),
            date: "2025-04-01".to_string(),
            city: Some("X".to_string()),
            state: Some("Y".to_string()),
            event_url: None,
        }
    }

    fn road_submission() -> SubmitEventRequest {
        SubmitEventRequest {
            url: Some("https://www.bikereg.com/race".to_string()),
            event_type: Some("road".to_string()),
        }
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_submit_event_created() {
        let mut lookup = MockEventLookup::new();
        lookup
            .expect_fetch_canonical_event()
            .with(eq("https://www.bikereg.com/race"))
            .times(1)
            .returning(|_| Ok(Some(details())));

        let mut store = MockEventStore::new();
        store
            .expect_insert()
            .withf(|event| {
                event.event_id == "42"
                    && event.event_type == EventType::Road
                    && event.city == "X"
                    && event.interested_riders.is_empty()
            })
            .times(1)
            .returning(|_| Ok(InsertResult { is_new: true }));

        let service = EventService::new(store, lookup);
        let outcome = service.submit_event(road_submission()).await.unwrap();

        assert_eq!(outcome, SubmissionOutcome::Created { event_id: "42".into() });
    }

    #[tokio::test]
    async fn test_submit_event_already_exists() {
        let mut lookup = MockEventLookup::new();
        lookup
            .expect_fetch_canonical_event()
            .returning(|_| Ok(Some(details())));

        let mut store = MockEventStore::new();
        store
            .expect_insert()
            .returning(|_| Ok(InsertResult { is_new: false }));

        let service = EventService::new(store, lookup);
        let outcome = service.submit_event(road_submission()).await.unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::AlreadyExists { event_id: "42".into() }
        );
    }

    #[tokio::test]
    async fn test_submit_event_validation_skips_lookup() {
        let mut lookup = MockEventLookup::new();
        lookup.expect_fetch_canonical_event().never();
        let mut store = MockEventStore::new();
        store.expect_insert().never();

        let service = EventService::new(store, lookup);
        let err = service
            .submit_event(SubmitEventRequest {
                url: Some("https://example.com/race".into()),
                event_type: Some("road".into()),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err, EventError::Validation(ref msg) if msg.starts_with("Invalid URL")),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_submit_event_unknown_upstream_is_not_found() {
        let mut lookup = MockEventLookup::new();
        lookup.expect_fetch_canonical_event().returning(|_| Ok(None));
        let mut store = MockEventStore::new();
        store.expect_insert().never();

        let service = EventService::new(store, lookup);
        let err = service.submit_event(road_submission()).await.unwrap_err();

        assert!(matches!(err, EventError::NotFound(ref msg) if msg == "Event not found"));
    }

    #[tokio::test]
    async fn test_submit_event_upstream_failure_propagates() {
        let mut lookup = MockEventLookup::new();
        lookup
            .expect_fetch_canonical_event()
            .returning(|_| Err(EventError::Upstream("timed out".into())));
        let mut store = MockEventStore::new();
        store.expect_insert().never();

        let service = EventService::new(store, lookup);
        let err = service.submit_event(road_submission()).await.unwrap_err();

        assert!(matches!(err, EventError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_submit_special_event_skips_lookup() {
        let mut lookup = MockEventLookup::new();
        lookup.expect_fetch_canonical_event().never();

        let mut store = MockEventStore::new();
        store
            .expect_insert()
            .withf(|event| event.event_type == EventType::Special && event.name == "Team Camp")
            .returning(|_| Ok(InsertResult { is_new: true }));

        let service = EventService::new(store, lookup);
        let outcome = service
            .submit_special_event(SpecialEventRequest {
                event_id: Some("69168".into()),
                event_type: Some("special".into()),
                name: Some("Team Camp".into()),
                date: Some("2025-04-28".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.event_id(), "69168");
    }

    #[tokio::test]
    async fn test_submit_special_event_missing_fields() {
        let service = EventService::new(MockEventStore::new(), MockEventLookup::new());
        let err = service
            .submit_special_event(SpecialEventRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation(ref msg) if msg == "Missing required fields"));
    }

    #[tokio::test]
    async fn test_events_by_type_normalizes_discipline() {
        let mut store = MockEventStore::new();
        store
            .expect_query_by_type_since()
            .with(eq(EventType::Cx), eq("2025-01-01"))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let service = EventService::new(store, MockEventLookup::new());
        let events = service
            .events_by_type(EventQueryParams {
                event_type: Some("CX".into()),
                start_date: Some("2025-01-01".into()),
            })
            .await
            .unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_events_by_type_defaults_to_today() {
        let today = today_iso();
        let mut store = MockEventStore::new();
        store
            .expect_query_by_type_since()
            .with(eq(EventType::Road), eq(today))
            .returning(|_, _| Ok(vec![]));

        let service = EventService::new(store, MockEventLookup::new());
        service
            .events_by_type(EventQueryParams {
                event_type: Some("road".into()),
                start_date: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_events_by_type_rejects_bad_date() {
        let mut store = MockEventStore::new();
        store.expect_query_by_type_since().never();

        let service = EventService::new(store, MockEventLookup::new());
        let err = service
            .events_by_type(EventQueryParams {
                event_type: Some("road".into()),
                start_date: Some("2025/01/01".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation(ref msg) if msg == "Invalid date format. Use YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_update_event_requires_identity() {
        let mut store = MockEventStore::new();
        store.expect_merge().never();
        let service = EventService::new(store, MockEventLookup::new());

        let err = service
            .update_event(as_map(json!({"eventId": "42", "housingUrl": "x"})))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation(ref msg) if msg == "eventId and eventType are required"));
    }

    #[tokio::test]
    async fn test_update_event_rejects_bad_field_type() {
        let mut store = MockEventStore::new();
        store.expect_merge().never();
        let service = EventService::new(store, MockEventLookup::new());

        let err = service
            .update_event(as_map(json!({
                "eventId": "42",
                "eventType": "road",
                "interestedRiders": "not-an-array"
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Validation(ref msg) if msg == "interestedRiders must be an array"));
    }

    #[tokio::test]
    async fn test_update_event_passes_only_present_fields() {
        let mut store = MockEventStore::new();
        store
            .expect_merge()
            .with(
                eq(EventType::Road),
                eq("42"),
                function(|patch: &EventPatch| {
                    patch.housing_url == Some(Some("https://stay.example/1".to_string()))
                        && patch.interested_riders.is_none()
                        && patch.description.is_none()
                }),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = EventService::new(store, MockEventLookup::new());
        service
            .update_event(as_map(json!({
                "eventId": "42",
                "eventType": "road",
                "housingUrl": "https://stay.example/1"
            })))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_event_not_found_propagates() {
        let mut store = MockEventStore::new();
        store
            .expect_merge()
            .returning(|_, _, _| Err(EventError::event_not_found()));

        let service = EventService::new(store, MockEventLookup::new());
        let err = service
            .update_event(as_map(json!({"eventId": "404", "eventType": "xc"})))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::NotFound(_)));
    }
}
