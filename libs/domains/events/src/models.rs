//! Event domain models

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

/// Event discipline; also the store partition key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
    Road,
    Cx,
    Xc,
    /// Team camps and other hand-curated events
    Special,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Road,
        EventType::Cx,
        EventType::Xc,
        EventType::Special,
    ];

    /// Disciplines that can be submitted by source URL.
    pub fn is_ingestible(self) -> bool {
        !matches!(self, EventType::Special)
    }

    /// Matches regardless of case: "ROAD" and "road" are the same discipline.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        Self::from_str(&value.to_ascii_lowercase()).ok()
    }

    pub fn collection_name(self) -> String {
        format!("events_{}", self)
    }

    /// "road, cx, xc, special"
    pub fn list() -> String {
        Self::ALL
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Carpool {
    pub name: String,
    pub seats: u32,
    #[serde(default)]
    pub riders: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Housing {
    #[serde(default)]
    pub committed: BTreeSet<String>,
    #[serde(default)]
    pub interested: BTreeSet<String>,
}

/// A scheduled athletic event.
///
/// Extension fields are always present once persisted: empty collections or
/// `null`, never missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    pub event_type: EventType,
    pub name: String,
    /// `YYYY-MM-DD` (special events may carry a full timestamp)
    pub date: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub event_url: Option<String>,

    #[serde(default)]
    pub interested_riders: BTreeSet<String>,
    #[serde(default)]
    pub committed_riders: BTreeSet<String>,
    #[serde(default)]
    pub housing_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub carpools: Vec<Carpool>,
    #[serde(default)]
    pub housing: Housing,
}

impl Event {
    /// New event with every extension field at its default.
    pub fn new(
        event_id: impl Into<String>,
        event_type: EventType,
        name: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type,
            name: name.into(),
            date: date.into(),
            city: String::new(),
            state: String::new(),
            event_url: None,
            interested_riders: BTreeSet::new(),
            committed_riders: BTreeSet::new(),
            housing_url: None,
            description: None,
            labels: BTreeSet::new(),
            carpools: Vec::new(),
            housing: Housing::default(),
        }
    }

    pub fn with_location(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = city.into();
        self.state = state.into();
        self
    }

    /// Writes only the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: &EventPatch) {
        if let Some(riders) = &patch.interested_riders {
            self.interested_riders = riders.clone();
        }
        if let Some(riders) = &patch.committed_riders {
            self.committed_riders = riders.clone();
        }
        if let Some(url) = &patch.housing_url {
            self.housing_url = url.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(labels) = &patch.labels {
            self.labels = labels.clone();
        }
        if let Some(carpools) = &patch.carpools {
            self.carpools = carpools.clone();
        }
        if let Some(housing) = &patch.housing {
            if let Some(committed) = &housing.committed {
                self.housing.committed = committed.clone();
            }
            if let Some(interested) = &housing.interested {
                self.housing.interested = interested.clone();
            }
        }
    }
}

/// Canonical fields returned by the event lookup service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(deserialize_with = "string_or_number")]
    pub event_id: String,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub event_url: Option<String>,
}

impl EventDetails {
    pub fn into_event(self, event_type: EventType) -> Event {
        let mut event = Event::new(self.event_id, event_type, self.name, self.date)
            .with_location(self.city.unwrap_or_default(), self.state.unwrap_or_default());
        event.event_url = self.event_url;
        event
    }
}

/// Body of `POST /submitEvent`.
///
/// Fields are optional so a missing one is reported as a validation message
/// rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEventRequest {
    /// Event page on the allowed registration site
    #[serde(default, deserialize_with = "loose_string")]
    pub url: Option<String>,
    /// One of road, cx, xc
    #[serde(default, deserialize_with = "loose_string")]
    pub event_type: Option<String>,
}

/// Body of `POST /submitSpecialEvent`: a complete event supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEventRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub event_url: Option<String>,
    #[serde(default)]
    pub housing_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interested_riders: BTreeSet<String>,
    #[serde(default)]
    pub committed_riders: BTreeSet<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub carpools: Vec<Carpool>,
    #[serde(default)]
    pub housing: Housing,
}

impl SpecialEventRequest {
    /// Builds the event. Callers validate required fields first; missing
    /// ones become empty strings.
    pub fn into_event(self, event_type: EventType) -> Event {
        Event {
            event_id: self.event_id.unwrap_or_default(),
            event_type,
            name: self.name.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            event_url: self.event_url,
            interested_riders: self.interested_riders,
            committed_riders: self.committed_riders,
            housing_url: self.housing_url,
            description: self.description,
            labels: self.labels,
            carpools: self.carpools,
            housing: self.housing,
        }
    }
}

/// Query string of `GET /getEventsByType`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventQueryParams {
    /// Discipline, case-insensitive
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`; defaults to today (UTC)
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HousingPatch {
    #[serde(default)]
    pub committed: Option<BTreeSet<String>>,
    #[serde(default)]
    pub interested: Option<BTreeSet<String>>,
}

/// Mutable fields of an event. `None` leaves the stored value untouched.
///
/// `housingUrl` and `description` distinguish absent (`None`) from an explicit
/// `null` (`Some(None)`), which clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interested_riders: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_riders: Option<BTreeSet<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, nullable)]
    pub housing_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carpools: Option<Vec<Carpool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing: Option<HousingPatch>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.interested_riders.is_none()
            && self.committed_riders.is_none()
            && self.housing_url.is_none()
            && self.description.is_none()
            && self.labels.is_none()
            && self.carpools.is_none()
            && self
                .housing
                .as_ref()
                .is_none_or(|h| h.committed.is_none() && h.interested.is_none())
    }
}

/// Body of `PATCH /updateEvent`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub event_id: String,
    pub event_type: String,
    #[serde(flatten)]
    pub patch: EventPatch,
}

/// Result of a store insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    pub is_new: bool,
}

/// How a submission ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created { event_id: String },
    /// Duplicate submission; the stored event was left untouched.
    AlreadyExists { event_id: String },
}

impl SubmissionOutcome {
    pub fn from_insert(result: InsertResult, event_id: String) -> Self {
        if result.is_new {
            Self::Created { event_id }
        } else {
            Self::AlreadyExists { event_id }
        }
    }

    pub fn event_id(&self) -> &str {
        match self {
            Self::Created { event_id } | Self::AlreadyExists { event_id } => event_id,
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validated text fields: any non-null JSON value is kept in its JSON text
/// form so a wrongly typed field fails validation with its own message.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(EventType::from_str("road").unwrap(), EventType::Road);
        assert!(EventType::from_str("Road").is_err());
        assert_eq!(EventType::parse_lenient("XC"), Some(EventType::Xc));
        assert_eq!(EventType::parse_lenient("gravel"), None);
    }

    #[test]
    fn test_submission_keeps_wrongly_typed_fields() {
        let request: SubmitEventRequest =
            serde_json::from_value(json!({ "url": 5, "eventType": "road" })).unwrap();
        assert_eq!(request.url.as_deref(), Some("5"));

        let request: SubmitEventRequest = serde_json::from_value(json!({ "url": null })).unwrap();
        assert_eq!(request.url, None);
        assert_eq!(request.event_type, None);

        let request: SpecialEventRequest =
            serde_json::from_value(json!({ "eventId": 69168, "name": ["x"] })).unwrap();
        assert_eq!(request.event_id.as_deref(), Some("69168"));
        assert_eq!(request.name.as_deref(), Some(r#"["x"]"#));
    }

    #[test]
    fn test_event_type_helpers() {
        assert_eq!(EventType::list(), "road, cx, xc, special");
        assert_eq!(EventType::Cx.collection_name(), "events_cx");
        assert!(EventType::Road.is_ingestible());
        assert!(!EventType::Special.is_ingestible());
    }

    #[test]
    fn test_event_serializes_defaults_as_empty_or_null() {
        let event = Event::new("42", EventType::Road, "Spring Classic", "2025-04-01");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["eventId"], "42");
        assert_eq!(value["eventType"], "road");
        assert_eq!(value["interestedRiders"], json!([]));
        assert_eq!(value["housingUrl"], json!(null));
        assert_eq!(value["description"], json!(null));
        assert_eq!(value["carpools"], json!([]));
        assert_eq!(value["housing"], json!({"committed": [], "interested": []}));
    }

    #[test]
    fn test_event_details_accepts_numeric_id() {
        let details: EventDetails = serde_json::from_value(json!({
            "eventId": 69168,
            "name": "Spring Team Camp",
            "date": "2025-04-28",
            "city": null,
            "state": "MA"
        }))
        .unwrap();

        assert_eq!(details.event_id, "69168");
        let event = details.into_event(EventType::Road);
        assert_eq!(event.city, "");
        assert_eq!(event.state, "MA");
        assert_eq!(event.event_url, None);
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: EventPatch =
            serde_json::from_value(json!({"housingUrl": null, "labels": ["team"]})).unwrap();

        assert_eq!(patch.housing_url, Some(None));
        assert_eq!(patch.description, None);
        assert!(!patch.is_empty());
        assert!(EventPatch::default().is_empty());
    }

    #[test]
    fn test_apply_patch_touches_only_present_fields() {
        let mut event = Event::new("42", EventType::Road, "Spring Classic", "2025-04-01");
        event.interested_riders.insert("alex".into());
        event.description = Some("Hilly".into());

        event.apply_patch(&EventPatch {
            housing_url: Some(Some("https://stay.example/1".into())),
            ..Default::default()
        });

        assert_eq!(event.housing_url.as_deref(), Some("https://stay.example/1"));
        assert!(event.interested_riders.contains("alex"));
        assert_eq!(event.description.as_deref(), Some("Hilly"));

        event.apply_patch(&EventPatch {
            description: Some(None),
            housing: Some(HousingPatch {
                committed: Some(BTreeSet::from(["sam".to_string()])),
                interested: None,
            }),
            ..Default::default()
        });

        assert_eq!(event.description, None);
        assert!(event.housing.committed.contains("sam"));
        assert!(event.housing.interested.is_empty());
    }

    #[test]
    fn test_update_request_flattens_patch() {
        let request: UpdateEventRequest = serde_json::from_value(json!({
            "eventId": "42",
            "eventType": "road",
            "interestedRiders": ["alex", "sam"],
            "somethingElse": true
        }))
        .unwrap();

        assert_eq!(request.event_id, "42");
        assert_eq!(request.patch.interested_riders.unwrap().len(), 2);
    }

    #[test]
    fn test_submission_outcome_from_insert() {
        let created = SubmissionOutcome::from_insert(InsertResult { is_new: true }, "42".into());
        assert_eq!(created, SubmissionOutcome::Created { event_id: "42".into() });

        let existing = SubmissionOutcome::from_insert(InsertResult { is_new: false }, "42".into());
        assert_eq!(existing.event_id(), "42");
        assert!(matches!(existing, SubmissionOutcome::AlreadyExists { .. }));
    }
}
