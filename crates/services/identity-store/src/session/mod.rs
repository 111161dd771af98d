//! Document session contract.
//!
//! A session is one unit of work against the document database: loads go
//! through its cache, writes are queued until the caller commits with
//! `save_changes`. Inserts and upserts are queued separately: only an
//! insert can collide with an existing key. The identity store only ever
//! queues writes.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use common::StoreResult;
use domain::{Document, KeyConventions};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

pub use memory::{InMemoryDocumentStore, InMemorySession, StoredDocument};

/// Unit-of-work session over a key/document store.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Naming rules of the underlying document store
    fn conventions(&self) -> &KeyConventions;

    /// Load a document by key, `None` when it does not exist
    async fn load(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Load a document and, in the same round trip, the document whose key
    /// is held by its `include_path` field
    async fn load_with_include(&self, key: &str, include_path: &str)
        -> StoreResult<Option<Value>>;

    /// Queue a new document under `key`; the commit fails with `Conflict`
    /// if `key` already exists by then
    async fn insert(&self, key: &str, document: Value) -> StoreResult<()>;

    /// Queue an insert or replace of `key`
    async fn store(&self, key: &str, document: Value) -> StoreResult<()>;

    /// Queue a deletion of `key`
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Commit every queued write as one batch
    async fn save_changes(&self) -> StoreResult<()>;
}

#[async_trait]
impl<T: DocumentSession + ?Sized> DocumentSession for Arc<T> {
    fn conventions(&self) -> &KeyConventions {
        (**self).conventions()
    }

    async fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).load(key).await
    }

    async fn load_with_include(
        &self,
        key: &str,
        include_path: &str,
    ) -> StoreResult<Option<Value>> {
        (**self).load_with_include(key, include_path).await
    }

    async fn insert(&self, key: &str, document: Value) -> StoreResult<()> {
        (**self).insert(key, document).await
    }

    async fn store(&self, key: &str, document: Value) -> StoreResult<()> {
        (**self).store(key, document).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key).await
    }

    async fn save_changes(&self) -> StoreResult<()> {
        (**self).save_changes().await
    }
}

/// Serialize a document for `DocumentSession::store`.
pub fn encode<D: Document>(document: &D) -> StoreResult<Value> {
    Ok(serde_json::to_value(document)?)
}

/// Deserialize the result of a session load.
pub fn decode<D: Document>(value: Option<Value>) -> StoreResult<Option<D>> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(Into::into)
}

/// Queue `document` as a new document under its own key.
pub async fn insert_document<S, D>(session: &S, document: &D) -> StoreResult<()>
where
    S: DocumentSession + ?Sized,
    D: Document,
{
    let value = encode(document)?;
    session.insert(document.key(), value).await
}

/// Queue an upsert of `document` under its own key.
pub async fn store_document<S, D>(session: &S, document: &D) -> StoreResult<()>
where
    S: DocumentSession + ?Sized,
    D: Document,
{
    let value = encode(document)?;
    session.store(document.key(), value).await
}
