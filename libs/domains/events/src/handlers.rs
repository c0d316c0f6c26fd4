//! HTTP handlers for the events API

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use axum_helpers::{ApiKeyConfig, AppError, ErrorResponse, method_not_allowed, require_api_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::enricher::EventLookup;
use crate::error::EventError;
use crate::models::{
    Event, EventQueryParams, SpecialEventRequest, SubmissionOutcome, SubmitEventRequest,
    UpdateEventRequest,
};
use crate::repository::EventStore;
use crate::service::EventService;

/// Events router state
pub type EventsState<S, L> = Arc<EventService<S, L>>;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEventResponse {
    pub success: bool,
    pub message: String,
    pub event_id: String,
}

/// Duplicate submission; carries the id of the stored event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventExistsResponse {
    pub message: String,
    pub event_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventsResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl IntoResponse for SubmissionOutcome {
    fn into_response(self) -> Response {
        match self {
            SubmissionOutcome::Created { event_id } => (
                StatusCode::OK,
                Json(SubmitEventResponse {
                    success: true,
                    message: "Event successfully added".to_string(),
                    event_id,
                }),
            )
                .into_response(),
            SubmissionOutcome::AlreadyExists { event_id } => (
                StatusCode::CONFLICT,
                Json(EventExistsResponse {
                    message: "Event already exists".to_string(),
                    event_id,
                }),
            )
                .into_response(),
        }
    }
}

/// Create the events router.
///
/// `/submitSpecialEvent` sits behind the `x-api-key` check; the other routes
/// are public. A wrong method on a known path answers a JSON 405.
pub fn router<S, L>(service: EventService<S, L>, api_key: ApiKeyConfig) -> Router
where
    S: EventStore + 'static,
    L: EventLookup + 'static,
{
    let shared_service = Arc::new(service);

    let protected = Router::new()
        .route(
            "/submitSpecialEvent",
            post(submit_special_event::<S, L>).fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key));

    Router::new()
        .route(
            "/submitEvent",
            post(submit_event::<S, L>).fallback(method_not_allowed),
        )
        .route(
            "/getEventsByType",
            get(get_events_by_type::<S, L>).fallback(method_not_allowed),
        )
        .route(
            "/updateEvent",
            patch(update_event::<S, L>).fallback(method_not_allowed),
        )
        .merge(protected)
        .with_state(shared_service)
}

/// Submit an event by its registration page URL
#[utoipa::path(
    post,
    path = "/submitEvent",
    request_body = SubmitEventRequest,
    responses(
        (status = 200, description = "Event stored", body = SubmitEventResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Lookup service does not know the URL", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 409, description = "Event already exists", body = EventExistsResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, payload))]
pub async fn submit_event<S: EventStore, L: EventLookup>(
    State(state): State<EventsState<S, L>>,
    payload: Result<Json<SubmitEventRequest>, JsonRejection>,
) -> Result<SubmissionOutcome, AppError> {
    let Json(request) = payload?;
    Ok(state.submit_event(request).await?)
}

/// Submit a complete event without lookup
#[utoipa::path(
    post,
    path = "/submitSpecialEvent",
    request_body = SpecialEventRequest,
    responses(
        (status = 200, description = "Event stored", body = SubmitEventResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 409, description = "Event already exists", body = EventExistsResponse),
        (status = 500, description = "Internal or configuration error", body = ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "events"
)]
#[instrument(skip(state, payload))]
pub async fn submit_special_event<S: EventStore, L: EventLookup>(
    State(state): State<EventsState<S, L>>,
    payload: Result<Json<SpecialEventRequest>, JsonRejection>,
) -> Result<SubmissionOutcome, AppError> {
    let Json(request) = payload?;
    Ok(state.submit_special_event(request).await?)
}

/// List events of one discipline from a start date on
#[utoipa::path(
    get,
    path = "/getEventsByType",
    params(EventQueryParams),
    responses(
        (status = 200, description = "Events ordered by date, possibly empty", body = EventsResponse),
        (status = 400, description = "Invalid type or date", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, params))]
pub async fn get_events_by_type<S: EventStore, L: EventLookup>(
    State(state): State<EventsState<S, L>>,
    params: Result<Query<EventQueryParams>, QueryRejection>,
) -> Result<Json<EventsResponse>, AppError> {
    let Query(params) = params?;
    let events = state.events_by_type(params).await?;
    Ok(Json(EventsResponse { events }))
}

/// Update the mutable fields of an event
#[utoipa::path(
    patch,
    path = "/updateEvent",
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, payload))]
pub async fn update_event<S: EventStore, L: EventLookup>(
    State(state): State<EventsState<S, L>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(body) = payload?;
    let Value::Object(body) = body else {
        return Err(
            EventError::Validation("eventId and eventType are required".to_string()).into(),
        );
    };

    state.update_event(body).await?;
    Ok(Json(MessageResponse {
        message: "Event updated successfully".to_string(),
    }))
}
