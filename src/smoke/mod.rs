//! Document database connection smoke test.
//!
//! Connects, inserts one fixed document, reads it back by image hash,
//! counts the collection and disconnects. The store is closed whatever
//! happens in between.

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "image_forensics";
pub const DEFAULT_COLLECTION: &str = "forensic_reports";

/// Image hash of the fixed test document.
pub const TEST_HASH: &str = "test-hash";

#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "mongo")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("{0}")]
    Other(String),
}

/// Where the smoke test connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokeTestConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for SmokeTestConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}

impl SmokeTestConfig {
    /// Check if this is the default config (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    pub analyzer: String,
    pub timestamp: DateTime<Utc>,
}

/// The record written by the smoke test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDocument {
    pub image_hash: String,
    pub filename: String,
    pub manipulation_score: f64,
    pub detected_regions: Vec<DetectedRegion>,
    pub metadata: TestMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestDocument {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            image_hash: TEST_HASH.to_string(),
            filename: "test-image.jpg".to_string(),
            manipulation_score: 75.5,
            detected_regions: vec![DetectedRegion {
                x: 100,
                y: 100,
                width: 200,
                height: 150,
                confidence: 0.85,
            }],
            metadata: TestMetadata {
                analyzer: "test-script".to_string(),
                timestamp: now,
            },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Minimal document store surface the smoke test needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name used in log lines.
    fn name(&self) -> &str;

    /// Round-trip to the server; establishes the connection.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a document and return its id.
    async fn insert(&self, document: &TestDocument) -> Result<String, StoreError>;

    async fn find_by_image_hash(&self, hash: &str)
        -> Result<Option<serde_json::Value>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokeStep {
    Connect,
    Insert,
    Find,
    Count,
}

impl fmt::Display for SmokeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Insert => "insert",
            Self::Find => "find",
            Self::Count => "count",
        };
        f.write_str(name)
    }
}

/// What the smoke test observed.
#[derive(Debug, Default)]
pub struct SmokeReport {
    pub inserted_id: Option<String>,
    pub found: Option<serde_json::Value>,
    pub count: Option<u64>,
    /// First failing step and its error.
    pub failure: Option<(SmokeStep, String)>,
    pub closed: bool,
}

impl SmokeReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run connect, insert, find, count against `store`, then close it.
pub async fn run_smoke_test(store: &dyn DocumentStore) -> SmokeReport {
    let mut report = SmokeReport::default();
    if let Err((step, e)) = run_steps(store, &mut report).await {
        error!("Smoke test failed at {}: {}", step, e);
        report.failure = Some((step, e.to_string()));
    }

    store.close().await;
    report.closed = true;
    info!("{} connection closed", store.name());
    report
}

async fn run_steps(
    store: &dyn DocumentStore,
    report: &mut SmokeReport,
) -> Result<(), (SmokeStep, StoreError)> {
    store.ping().await.map_err(|e| (SmokeStep::Connect, e))?;
    info!("Connected successfully to {} server", store.name());

    let document = TestDocument::new(Utc::now());
    let id = store
        .insert(&document)
        .await
        .map_err(|e| (SmokeStep::Insert, e))?;
    info!("Inserted test document with ID: {}", id);
    report.inserted_id = Some(id);

    let found = store
        .find_by_image_hash(TEST_HASH)
        .await
        .map_err(|e| (SmokeStep::Find, e))?;
    match found {
        Some(ref doc) => info!("Found document: {}", doc),
        None => info!("No document found for imageHash {}", TEST_HASH),
    }
    report.found = found;

    let count = store.count().await.map_err(|e| (SmokeStep::Count, e))?;
    info!("Total documents in collection: {}", count);
    report.count = Some(count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<Vec<serde_json::Value>>,
        fail_on: Option<SmokeStep>,
        closed: AtomicBool,
    }

    impl MemoryStore {
        fn failing(step: SmokeStep) -> Self {
            Self {
                fail_on: Some(step),
                ..Default::default()
            }
        }

        fn check(&self, step: SmokeStep) -> Result<(), StoreError> {
            if self.fail_on == Some(step) {
                return Err(StoreError::Other(format!("{} refused", step)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.check(SmokeStep::Connect)
        }

        async fn insert(&self, document: &TestDocument) -> Result<String, StoreError> {
            self.check(SmokeStep::Insert)?;
            let value =
                serde_json::to_value(document).map_err(|e| StoreError::Encode(e.to_string()))?;
            let mut docs = self.docs.lock().unwrap();
            docs.push(value);
            Ok(format!("doc-{}", docs.len()))
        }

        async fn find_by_image_hash(
            &self,
            hash: &str,
        ) -> Result<Option<serde_json::Value>, StoreError> {
            self.check(SmokeStep::Find)?;
            let docs = self.docs.lock().unwrap();
            Ok(docs.iter().find(|d| d["imageHash"] == hash).cloned())
        }

        async fn count(&self) -> Result<u64, StoreError> {
            self.check(SmokeStep::Count)?;
            Ok(self.docs.lock().unwrap().len() as u64)
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_smoke_test_success() {
        let store = MemoryStore::default();
        store
            .docs
            .lock()
            .unwrap()
            .push(serde_json::json!({"imageHash": "other"}));

        let report = run_smoke_test(&store).await;

        assert!(report.is_success());
        assert_eq!(report.inserted_id.as_deref(), Some("doc-2"));
        assert_eq!(report.count, Some(2));
        let found = report.found.unwrap();
        assert_eq!(found["imageHash"], "test-hash");
        assert_eq!(found["filename"], "test-image.jpg");
        assert_eq!(found["manipulationScore"], 75.5);
        assert_eq!(found["detectedRegions"][0]["width"], 200);
        assert_eq!(found["metadata"]["analyzer"], "test-script");
        assert!(store.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connect_failure_still_closes() {
        let store = MemoryStore::failing(SmokeStep::Connect);
        let report = run_smoke_test(&store).await;

        assert!(!report.is_success());
        assert_eq!(report.failure.as_ref().unwrap().0, SmokeStep::Connect);
        assert!(report.inserted_id.is_none());
        assert!(report.closed);
        assert!(store.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_steps() {
        let store = MemoryStore::failing(SmokeStep::Find);
        let report = run_smoke_test(&store).await;

        let (step, message) = report.failure.unwrap();
        assert_eq!(step, SmokeStep::Find);
        assert_eq!(message, "find refused");
        assert!(report.inserted_id.is_some());
        assert!(report.count.is_none());
        assert!(store.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fixed_document() {
        let now = Utc::now();
        let doc = TestDocument::new(now);
        assert_eq!(doc.image_hash, TEST_HASH);
        assert_eq!(doc.detected_regions.len(), 1);
        assert_eq!(doc.detected_regions[0].confidence, 0.85);
        assert_eq!(doc.metadata.timestamp, now);
        assert_eq!(doc.created_at, doc.updated_at);
    }
}
