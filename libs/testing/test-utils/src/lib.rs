//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for the domain crates:
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestMongo, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let db = mongo.database(&builder.database_name());
//!     let event_id = builder.event_id("main");
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_submit_event");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Numeric-looking event id, unique per test and suffix
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.event_id("a"), builder.event_id("a"));
    /// assert_ne!(builder.event_id("a"), builder.event_id("b"));
    /// ```
    pub fn event_id(&self, suffix: &str) -> String {
        let offset: u64 = suffix.bytes().map(u64::from).sum();
        format!("{}", (self.seed % 1_000_000).wrapping_add(offset * 1_000_003))
    }

    /// Generate a unique name for testing
    ///
    /// `prefix` is the kind of thing (e.g. "event", "carpool"), `suffix` tells
    /// apart several within one test. Returns e.g. "test-event-12345-main".
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Database name private to one test
    pub fn database_name(&self) -> String {
        format!("test_{}", self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that a result is an error whose message contains `needle`
    pub fn assert_err_contains<T: std::fmt::Debug, E: std::fmt::Display>(
        result: Result<T, E>,
        needle: &str,
    ) {
        match result {
            Ok(value) => panic!("expected error containing {:?}, got Ok({:?})", needle, value),
            Err(e) => assert!(
                e.to_string().contains(needle),
                "expected error containing {:?}, got {:?}",
                needle,
                e.to_string()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.event_id("main"), builder2.event_id("main"));
        assert_eq!(builder1.name("event", "test"), builder2.name("event", "test"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.database_name(), builder2.database_name());
    }

    #[test]
    fn test_event_id_is_numeric() {
        let builder = TestDataBuilder::from_test_name("numeric");
        assert!(builder.event_id("x").chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    #[should_panic(expected = "expected error")]
    fn test_assert_err_contains_panics_on_ok() {
        assertions::assert_err_contains::<u8, String>(Ok(1), "boom");
    }
}
