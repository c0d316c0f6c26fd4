//! Events Domain
//!
//! Ingestion, deduplication, partial updates and date-ranged queries for a
//! catalog of scheduled athletic events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Event Flow                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  POST /submitEvent ──► validation ──► EventLookup (GraphQL)   │
//! │                                            │                  │
//! │                                            ▼                  │
//! │  POST /submitSpecialEvent ──► validation ──► EventStore       │
//! │                                              insert           │
//! │  GET  /getEventsByType ─────► validation ──► query            │
//! │  PATCH /updateEvent ────────► validation ──► merge            │
//! │                                              │                │
//! │                                 ┌────────────┴─────────┐      │
//! │                                 ▼                      ▼      │
//! │                          MongoEventStore     InMemoryEventStore│
//! │                        (events_<discipline>)                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub mod enricher;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod validation;

pub use enricher::{EventLookup, GraphqlEventLookup, LookupConfig};
pub use error::{EventError, EventResult};
pub use handlers::{
    EventExistsResponse, EventsResponse, MessageResponse, SubmitEventResponse, router,
};
pub use models::{
    Carpool, Event, EventDetails, EventPatch, EventQueryParams, EventType, Housing, HousingPatch,
    InsertResult, SpecialEventRequest, SubmissionOutcome, SubmitEventRequest, UpdateEventRequest,
};
pub use mongodb::MongoEventStore;
pub use repository::{EventStore, InMemoryEventStore};
pub use service::EventService;

/// OpenAPI documentation for Events API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::submit_event,
        handlers::submit_special_event,
        handlers::get_events_by_type,
        handlers::update_event,
    ),
    components(schemas(
        Event,
        EventType,
        Carpool,
        Housing,
        HousingPatch,
        EventPatch,
        SubmitEventRequest,
        SpecialEventRequest,
        UpdateEventRequest,
        SubmitEventResponse,
        EventExistsResponse,
        EventsResponse,
        MessageResponse,
        axum_helpers::ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "events", description = "Athletic event ingestion and queries")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                axum_helpers::API_KEY_HEADER,
            ))),
        );
    }
}
