use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EventError, EventResult};
use crate::models::{Event, EventPatch, EventType, InsertResult};

/// Event persistence, partitioned by discipline and keyed by event id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Point lookup within one discipline.
    async fn exists(&self, event_type: EventType, event_id: &str) -> EventResult<bool>;

    /// Stores `event` unless `(event_type, event_id)` is already taken.
    /// An existing document is never modified.
    async fn insert(&self, event: Event) -> EventResult<InsertResult>;

    /// Writes only the fields present in `patch`. Never creates a document:
    /// a missing event is `EventError::NotFound`.
    async fn merge(&self, event_type: EventType, event_id: &str, patch: EventPatch)
    -> EventResult<()>;

    /// Events with `date >= start_date`, ascending by date.
    async fn query_by_type_since(
        &self,
        event_type: EventType,
        start_date: &str,
    ) -> EventResult<Vec<Event>>;

    /// Reachability check for readiness probes.
    async fn ping(&self) -> EventResult<()>;
}

/// In-memory implementation of EventStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    partitions: Arc<RwLock<HashMap<EventType, BTreeMap<String, Event>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored copy of an event, for assertions.
    pub async fn get(&self, event_type: EventType, event_id: &str) -> Option<Event> {
        let partitions = self.partitions.read().await;
        partitions
            .get(&event_type)
            .and_then(|events| events.get(event_id))
            .cloned()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn exists(&self, event_type: EventType, event_id: &str) -> EventResult<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&event_type)
            .is_some_and(|events| events.contains_key(event_id)))
    }

    async fn insert(&self, event: Event) -> EventResult<InsertResult> {
        let mut partitions = self.partitions.write().await;
        let events = partitions.entry(event.event_type).or_default();

        if events.contains_key(&event.event_id) {
            return Ok(InsertResult { is_new: false });
        }

        tracing::info!(event_id = %event.event_id, event_type = %event.event_type, "Stored event");
        events.insert(event.event_id.clone(), event);
        Ok(InsertResult { is_new: true })
    }

    async fn merge(
        &self,
        event_type: EventType,
        event_id: &str,
        patch: EventPatch,
    ) -> EventResult<()> {
        let mut partitions = self.partitions.write().await;
        let event = partitions
            .get_mut(&event_type)
            .and_then(|events| events.get_mut(event_id))
            .ok_or_else(EventError::event_not_found)?;

        event.apply_patch(&patch);
        Ok(())
    }

    async fn query_by_type_since(
        &self,
        event_type: EventType,
        start_date: &str,
    ) -> EventResult<Vec<Event>> {
        let partitions = self.partitions.read().await;

        let mut result: Vec<Event> = partitions
            .get(&event_type)
            .map(|events| {
                events
                    .values()
                    .filter(|e| e.date.as_str() >= start_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        result.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(result)
    }

    async fn ping(&self) -> EventResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HousingPatch;
    use std::collections::BTreeSet;

    fn road(id: &str, date: &str) -> Event {
        Event::new(id, EventType::Road, format!("Race {id}"), date)
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_and_never_overwrites() {
        let store = InMemoryEventStore::new();

        let first = store.insert(road("42", "2025-04-01")).await.unwrap();
        assert!(first.is_new);

        let mut changed = road("42", "2025-04-01");
        changed.name = "Renamed".to_string();
        let second = store.insert(changed).await.unwrap();
        assert!(!second.is_new);

        let stored = store.get(EventType::Road, "42").await.unwrap();
        assert_eq!(stored.name, "Race 42");
    }

    #[tokio::test]
    async fn test_same_id_in_different_disciplines() {
        let store = InMemoryEventStore::new();
        store.insert(road("7", "2025-01-01")).await.unwrap();

        let cx = Event::new("7", EventType::Cx, "Cross 7", "2025-10-01");
        assert!(store.insert(cx).await.unwrap().is_new);

        assert!(store.exists(EventType::Road, "7").await.unwrap());
        assert!(store.exists(EventType::Cx, "7").await.unwrap());
        assert!(!store.exists(EventType::Xc, "7").await.unwrap());
    }

    #[tokio::test]
    async fn test_query_orders_by_date_and_filters_inclusive() {
        let store = InMemoryEventStore::new();
        store.insert(road("c", "2025-01-03")).await.unwrap();
        store.insert(road("a", "2025-01-01")).await.unwrap();
        store.insert(road("b", "2025-01-02")).await.unwrap();

        let all = store
            .query_by_type_since(EventType::Road, "2025-01-01")
            .await
            .unwrap();
        let dates: Vec<_> = all.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, ["2025-01-01", "2025-01-02", "2025-01-03"]);

        let later = store
            .query_by_type_since(EventType::Road, "2025-01-02")
            .await
            .unwrap();
        assert_eq!(later.len(), 2);
        assert!(later.iter().all(|e| e.event_id != "a"));
    }

    #[tokio::test]
    async fn test_query_empty_partition() {
        let store = InMemoryEventStore::new();
        let events = store
            .query_by_type_since(EventType::Xc, "2025-01-01")
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_merge_sets_only_given_fields() {
        let store = InMemoryEventStore::new();
        let mut event = road("42", "2025-04-01");
        event.interested_riders = BTreeSet::from(["alex".to_string()]);
        event.description = Some("Hilly".to_string());
        store.insert(event).await.unwrap();

        store
            .merge(
                EventType::Road,
                "42",
                EventPatch {
                    housing_url: Some(Some("https://stay.example/1".into())),
                    housing: Some(HousingPatch {
                        interested: Some(BTreeSet::from(["sam".to_string()])),
                        committed: None,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = store.get(EventType::Road, "42").await.unwrap();
        assert_eq!(stored.housing_url.as_deref(), Some("https://stay.example/1"));
        assert!(stored.interested_riders.contains("alex"));
        assert_eq!(stored.description.as_deref(), Some("Hilly"));
        assert!(stored.housing.interested.contains("sam"));
    }

    #[tokio::test]
    async fn test_merge_missing_event_is_not_found() {
        let store = InMemoryEventStore::new();
        let err = store
            .merge(EventType::Road, "404", EventPatch::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::NotFound(_)));
        assert!(!store.exists(EventType::Road, "404").await.unwrap());
    }
}
