//! MongoDB implementation of EventStore
//!
//! One collection per discipline (`events_road`, `events_cx`, ...). The event
//! id is the document `_id`; the discipline is implied by the collection and
//! not stored.

use crate::error::{EventError, EventResult};
use crate::models::{Carpool, Event, EventPatch, EventType, Housing, InsertResult};
use crate::repository::EventStore;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document, doc, to_bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    state: String,
    #[serde(default)]
    event_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    interested_riders: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    committed_riders: BTreeSet<String>,
    #[serde(default)]
    housing_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    carpools: Vec<Carpool>,
    #[serde(default, deserialize_with = "null_as_default")]
    housing: Housing,
}

impl From<Event> for EventDocument {
    fn from(event: Event) -> Self {
        Self {
            id: event.event_id,
            name: event.name,
            date: event.date,
            city: event.city,
            state: event.state,
            event_url: event.event_url,
            interested_riders: event.interested_riders,
            committed_riders: event.committed_riders,
            housing_url: event.housing_url,
            description: event.description,
            labels: event.labels,
            carpools: event.carpools,
            housing: event.housing,
        }
    }
}

impl EventDocument {
    fn into_event(self, event_type: EventType) -> Event {
        Event {
            event_id: self.id,
            event_type,
            name: self.name,
            date: self.date,
            city: self.city,
            state: self.state,
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

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `$set` stage of a pipeline update: only present fields, each wrapped in
/// `$literal` so rider names starting with `$` stay plain strings. Housing
/// members are merged into the stored object, with a `null` or missing
/// `housing` treated as empty.
fn set_document(patch: &EventPatch) -> EventResult<Document> {
    fn literal(value: Bson) -> Bson {
        Bson::Document(doc! { "$literal": value })
    }

    let mut set = Document::new();

    if let Some(riders) = &patch.interested_riders {
        set.insert("interestedRiders", literal(to_bson(riders)?));
    }
    if let Some(riders) = &patch.committed_riders {
        set.insert("committedRiders", literal(to_bson(riders)?));
    }
    if let Some(url) = &patch.housing_url {
        set.insert("housingUrl", literal(to_bson(url)?));
    }
    if let Some(description) = &patch.description {
        set.insert("description", literal(to_bson(description)?));
    }
    if let Some(labels) = &patch.labels {
        set.insert("labels", literal(to_bson(labels)?));
    }
    if let Some(carpools) = &patch.carpools {
        set.insert("carpools", literal(to_bson(carpools)?));
    }
    if let Some(housing) = &patch.housing {
        let mut members = Document::new();
        if let Some(committed) = &housing.committed {
            members.insert("committed", literal(to_bson(committed)?));
        }
        if let Some(interested) = &housing.interested {
            members.insert("interested", literal(to_bson(interested)?));
        }
        if !members.is_empty() {
            set.insert(
                "housing",
                doc! { "$mergeObjects": [{ "$ifNull": ["$housing", {}] }, members] },
            );
        }
    }

    Ok(set)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// MongoDB-based event store
#[derive(Clone)]
pub struct MongoEventStore {
    database: Database,
}

impl MongoEventStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self, event_type: EventType) -> Collection<EventDocument> {
        self.database.collection(&event_type.collection_name())
    }

    /// Ascending `date` index on every discipline collection.
    pub async fn create_indexes(&self) -> EventResult<()> {
        for event_type in EventType::ALL {
            let index = IndexModel::builder().keys(doc! { "date": 1 }).build();
            self.collection(event_type).create_index(index).await?;
        }

        info!("Event indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl EventStore for MongoEventStore {
    #[instrument(skip(self), fields(event_type = %event_type))]
    async fn exists(&self, event_type: EventType, event_id: &str) -> EventResult<bool> {
        let count = self
            .collection(event_type)
            .count_documents(doc! { "_id": event_id })
            .await?;
        Ok(count > 0)
    }

    /// Conditional create: the unique `_id` index rejects a second insert, so
    /// concurrent submissions of one event yield exactly one `is_new`.
    #[instrument(skip(self, event), fields(event_type = %event.event_type, event_id = %event.event_id))]
    async fn insert(&self, event: Event) -> EventResult<InsertResult> {
        let collection = self.collection(event.event_type);

        match collection.insert_one(EventDocument::from(event)).await {
            Ok(_) => Ok(InsertResult { is_new: true }),
            Err(e) if is_duplicate_key(&e) => Ok(InsertResult { is_new: false }),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, patch), fields(event_type = %event_type))]
    async fn merge(
        &self,
        event_type: EventType,
        event_id: &str,
        patch: EventPatch,
    ) -> EventResult<()> {
        let set = set_document(&patch)?;

        if set.is_empty() {
            return if self.exists(event_type, event_id).await? {
                Ok(())
            } else {
                Err(EventError::event_not_found())
            };
        }

        let result = self
            .collection(event_type)
            .update_one(doc! { "_id": event_id }, vec![doc! { "$set": set }])
            .await?;

        if result.matched_count == 0 {
            return Err(EventError::event_not_found());
        }
        Ok(())
    }

    #[instrument(skip(self), fields(event_type = %event_type))]
    async fn query_by_type_since(
        &self,
        event_type: EventType,
        start_date: &str,
    ) -> EventResult<Vec<Event>> {
        let cursor = self
            .collection(event_type)
            .find(doc! { "date": { "$gte": start_date } })
            .sort(doc! { "date": 1 })
            .await?;

        let documents: Vec<EventDocument> = cursor.try_collect().await?;
        Ok(documents
            .into_iter()
            .map(|d| d.into_event(event_type))
            .collect())
    }

    async fn ping(&self) -> EventResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HousingPatch;
    use mongodb::bson::{from_document, to_document};

    #[test]
    fn test_set_document_contains_only_present_fields() {
        let patch = EventPatch {
            housing_url: Some(None),
            labels: Some(BTreeSet::from(["$team".to_string()])),
            housing: Some(HousingPatch {
                committed: Some(BTreeSet::new()),
                interested: None,
            }),
            ..Default::default()
        };

        let set = set_document(&patch).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.get("housingUrl"),
            Some(&Bson::Document(doc! { "$literal": Bson::Null }))
        );
        assert_eq!(
            set.get_document("labels").unwrap(),
            &doc! { "$literal": ["$team"] }
        );
        assert!(!set.contains_key("description"));
    }

    #[test]
    fn test_set_document_merges_housing_over_null() {
        let patch = EventPatch {
            housing: Some(HousingPatch {
                committed: None,
                interested: Some(BTreeSet::from(["carol".to_string()])),
            }),
            ..Default::default()
        };

        let set = set_document(&patch).unwrap();
        assert_eq!(
            set.get_document("housing").unwrap(),
            &doc! {
                "$mergeObjects": [
                    { "$ifNull": ["$housing", {}] },
                    { "interested": { "$literal": ["carol"] } },
                ]
            }
        );
        assert!(!set.contains_key("housing.interested"));

        let empty_housing = EventPatch {
            housing: Some(HousingPatch::default()),
            ..Default::default()
        };
        assert!(set_document(&empty_housing).unwrap().is_empty());
    }

    #[test]
    fn test_set_document_empty_patch() {
        assert!(set_document(&EventPatch::default()).unwrap().is_empty());
    }

    #[test]
    fn test_document_omits_event_type_and_uses_id() {
        let event = Event::new("42", EventType::Road, "Spring Classic", "2025-04-01");
        let document = to_document(&EventDocument::from(event)).unwrap();

        assert_eq!(document.get_str("_id").unwrap(), "42");
        assert!(!document.contains_key("eventType"));
        assert!(!document.contains_key("eventId"));
        assert_eq!(document.get("housingUrl"), Some(&Bson::Null));
    }

    #[test]
    fn test_sparse_document_is_normalized() {
        let stored = doc! {
            "_id": "7",
            "name": "Old Race",
            "date": "2024-09-01",
            "interestedRiders": Bson::Null,
        };

        let event = from_document::<EventDocument>(stored)
            .unwrap()
            .into_event(EventType::Cx);

        assert_eq!(event.event_type, EventType::Cx);
        assert!(event.interested_riders.is_empty());
        assert!(event.carpools.is_empty());
        assert_eq!(event.housing, Housing::default());
        assert_eq!(event.description, None);
        assert_eq!(event.city, "");
    }
}
