//! Request validation.
//!
//! Pure checks with no I/O. Each `validate_*` returns the first problem as a
//! client-facing message, or `None` when the input is acceptable.

use crate::models::{EventType, SpecialEventRequest, SubmitEventRequest};
use chrono::Utc;
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// The only host event pages may be submitted from.
pub const ALLOWED_HOST: &str = "www.bikereg.com";

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";
pub const INVALID_EVENT_TYPE: &str = "Invalid event type";
pub const INVALID_DATE_FORMAT: &str = "Invalid date format. Use YYYY-MM-DD";

const SET_FIELDS: [&str; 3] = ["interestedRiders", "committedRiders", "labels"];
const NULLABLE_STRING_FIELDS: [&str; 2] = ["housingUrl", "description"];

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("ISO date pattern is valid")
});

/// Exact, case-sensitive discipline match.
pub fn validate_event_type(value: &str) -> bool {
    EventType::from_str(value).is_ok()
}

/// Absolute URL whose hostname is [`ALLOWED_HOST`]. Unparseable input is
/// simply invalid.
pub fn validate_url(value: &str) -> bool {
    Url::parse(value)
        .ok()
        .is_some_and(|url| url.host_str() == Some(ALLOWED_HOST))
}

pub fn is_iso_date(value: &str) -> bool {
    ISO_DATE.is_match(value)
}

/// Today's date in UTC as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub fn validate_submission(request: &SubmitEventRequest) -> Option<String> {
    let (Some(url), Some(event_type)) = (present(&request.url), present(&request.event_type))
    else {
        return Some(MISSING_REQUIRED_FIELDS.to_string());
    };

    let ingestible = EventType::from_str(event_type).is_ok_and(EventType::is_ingestible);
    if !ingestible {
        return Some(INVALID_EVENT_TYPE.to_string());
    }

    if !validate_url(url) {
        return Some(format!(
            "Invalid URL. Only {} URLs are allowed",
            ALLOWED_HOST
        ));
    }

    None
}

pub fn validate_special_event(request: &SpecialEventRequest) -> Option<String> {
    let required = [
        &request.event_id,
        &request.event_type,
        &request.name,
        &request.date,
    ];
    if required.iter().any(|field| present(field).is_none()) {
        return Some(MISSING_REQUIRED_FIELDS.to_string());
    }

    if !request
        .event_type
        .as_deref()
        .is_some_and(validate_event_type)
    {
        return Some(INVALID_EVENT_TYPE.to_string());
    }

    None
}

/// `event_type` is matched case-insensitively; `start_date` is optional.
pub fn validate_query(event_type: Option<&str>, start_date: Option<&str>) -> Option<String> {
    let known = event_type
        .filter(|t| !t.is_empty())
        .and_then(EventType::parse_lenient)
        .is_some();
    if !known {
        return Some(format!(
            "Invalid event type. Must be one of: {}",
            EventType::list()
        ));
    }

    match start_date {
        Some(date) if !is_iso_date(date) => Some(INVALID_DATE_FORMAT.to_string()),
        _ => None,
    }
}

fn check_string_array(field: &str, value: &Value) -> Option<String> {
    let Some(items) = value.as_array() else {
        return Some(format!("{} must be an array", field));
    };
    if items.iter().any(|item| !item.is_string()) {
        return Some(format!("{} must be an array of strings", field));
    }
    None
}

fn check_housing(value: &Value) -> Option<String> {
    let Some(housing) = value.as_object() else {
        return Some("housing must be an object".to_string());
    };

    ["committed", "interested"].iter().find_map(|key| {
        housing
            .get(*key)
            .and_then(|members| check_string_array(&format!("housing.{}", key), members))
    })
}

fn check_carpools(value: &Value) -> Option<String> {
    let Some(carpools) = value.as_array() else {
        return Some("carpools must be an array".to_string());
    };

    carpools.iter().enumerate().find_map(|(i, carpool)| {
        let Some(carpool) = carpool.as_object() else {
            return Some(format!("carpools[{}] must be an object", i));
        };

        let named = carpool
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.trim().is_empty());
        if !named {
            return Some(format!("carpools[{}].name must be a non-empty string", i));
        }

        let seats_ok = carpool
            .get("seats")
            .and_then(Value::as_u64)
            .is_some_and(|seats| seats > 0 && u32::try_from(seats).is_ok());
        if !seats_ok {
            return Some(format!("carpools[{}].seats must be a positive integer", i));
        }

        match carpool.get("riders") {
            Some(riders) => check_string_array(&format!("carpools[{}].riders", i), riders),
            None => Some(format!("carpools[{}].riders must be an array", i)),
        }
    })
}

/// Type-checks the optional mutable fields of a patch. Unknown keys are
/// ignored; the first violation wins.
pub fn validate_patch(fields: &Map<String, Value>) -> Option<String> {
    for field in SET_FIELDS {
        if let Some(message) = fields.get(field).and_then(|v| check_string_array(field, v)) {
            return Some(message);
        }
    }

    for field in NULLABLE_STRING_FIELDS {
        match fields.get(field) {
            Some(Value::String(_)) | Some(Value::Null) | None => {}
            Some(_) => return Some(format!("{} must be a string", field)),
        }
    }

    if let Some(message) = fields.get("carpools").and_then(check_carpools) {
        return Some(message);
    }

    fields.get("housing").and_then(check_housing)
}
