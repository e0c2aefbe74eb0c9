//! MongoDB document store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::{Client, Collection};

use super::{DocumentStore, SmokeTestConfig, StoreError, TestDocument};

pub struct MongoStore {
    client: Client,
    database: String,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Parse the URI and prepare a client. No traffic until the first operation.
    pub async fn connect(config: &SmokeTestConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        Ok(Self {
            client,
            database: config.database.clone(),
            collection,
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn name(&self) -> &str {
        "MongoDB"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn insert(&self, document: &TestDocument) -> Result<String, StoreError> {
        let result = self.collection.insert_one(to_bson(document)?).await?;
        Ok(match result.inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            other => other.to_string(),
        })
    }

    async fn find_by_image_hash(
        &self,
        hash: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let found = self.collection.find_one(doc! { "imageHash": hash }).await?;
        Ok(found.map(|d| Bson::Document(d).into_relaxed_extjson()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

fn bson_date(ts: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(ts.timestamp_millis()))
}

/// Encode the document, storing timestamps as native dates.
fn to_bson(document: &TestDocument) -> Result<Document, StoreError> {
    let mut doc = bson::to_document(document).map_err(|e| StoreError::Encode(e.to_string()))?;
    doc.insert("createdAt", bson_date(document.created_at));
    doc.insert("updatedAt", bson_date(document.updated_at));
    if let Ok(metadata) = doc.get_document_mut("metadata") {
        metadata.insert("timestamp", bson_date(document.metadata.timestamp));
    }
    Ok(doc)
}
