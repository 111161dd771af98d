//! In-memory document store and session.
//!
//! Behaves like a small document database: documents are JSON values keyed
//! by string, each write bumps a global etag, and a session batches its
//! writes until `save_changes` applies them in one critical section.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use common::{StoreError, StoreResult};
use domain::KeyConventions;

use super::DocumentSession;

/// A committed document with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub body: Value,
    /// Store-wide write counter at the time of the last write
    pub etag: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<String, StoredDocument>,
    last_etag: u64,
}

/// Shared in-memory document database.
///
/// Cloning is cheap; clones see the same documents.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
    conventions: KeyConventions,
}

impl InMemoryDocumentStore {
    /// Create an empty store with default conventions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom conventions
    pub fn with_conventions(conventions: KeyConventions) -> Self {
        Self {
            state: Arc::default(),
            conventions,
        }
    }

    pub fn conventions(&self) -> &KeyConventions {
        &self.conventions
    }

    /// Open a new unit of work.
    pub fn open_session(&self) -> InMemorySession {
        InMemorySession::new(self.clone())
    }

    /// Number of committed documents
    pub fn document_count(&self) -> usize {
        self.read().documents.len()
    }

    /// Committed document with metadata, bypassing any session
    pub fn document(&self, key: &str) -> Option<StoredDocument> {
        self.read().documents.get(key).cloned()
    }

    /// All committed documents ordered by key
    pub fn documents(&self) -> Vec<(String, Value)> {
        let state = self.read();
        let mut documents: Vec<(String, Value)> = state
            .documents
            .iter()
            .map(|(key, stored)| (key.clone(), stored.body.clone()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        documents
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.read().documents.get(key).map(|stored| stored.body.clone())
    }
}

#[derive(Debug, Clone)]
enum PendingWrite {
    /// New document, must not exist at commit
    Insert(Value),
    /// Insert or replace
    Store(Value),
    Delete,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Documents seen by this session, `None` for known misses
    cache: HashMap<String, Option<Value>>,
    pending: BTreeMap<String, PendingWrite>,
    requests: usize,
}

impl SessionState {
    /// Resolve `key` without a round trip, pending writes first.
    fn local(&self, key: &str) -> Option<Option<Value>> {
        match self.pending.get(key) {
            Some(PendingWrite::Insert(value) | PendingWrite::Store(value)) => {
                Some(Some(value.clone()))
            }
            Some(PendingWrite::Delete) => Some(None),
            None => self.cache.get(key).cloned(),
        }
    }

    fn remember(&mut self, key: &str, value: Option<Value>) {
        self.cache.insert(key.to_string(), value);
    }

    fn queue(&mut self, key: &str, write: PendingWrite) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::session("cannot store a document without a key"));
        }
        self.pending.insert(key.to_string(), write);
        Ok(())
    }
}

/// Unit of work over an [`InMemoryDocumentStore`].
pub struct InMemorySession {
    id: Uuid,
    store: InMemoryDocumentStore,
    state: Mutex<SessionState>,
}

impl InMemorySession {
    fn new(store: InMemoryDocumentStore) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, "session opened");

        Self {
            id,
            store,
            state: Mutex::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Round trips made to the store so far (loads and commits)
    pub fn number_of_requests(&self) -> usize {
        self.lock().requests
    }

    /// Check if writes are waiting for `save_changes`
    pub fn has_changes(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Keys with a queued write, in key order
    pub fn pending_keys(&self) -> Vec<String> {
        self.lock().pending.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentSession for InMemorySession {
    fn conventions(&self) -> &KeyConventions {
        self.store.conventions()
    }

    async fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let mut state = self.lock();
        if let Some(value) = state.local(key) {
            return Ok(value);
        }

        state.requests += 1;
        let value = self.store.fetch(key);
        state.remember(key, value.clone());

        Ok(value)
    }

    async fn load_with_include(
        &self,
        key: &str,
        include_path: &str,
    ) -> StoreResult<Option<Value>> {
        let mut state = self.lock();

        let document = match state.local(key) {
            Some(document) => document,
            None => {
                state.requests += 1;
                let document = self.store.fetch(key);
                state.remember(key, document.clone());

                // Same round trip: warm the referenced document too.
                if let Some(included) = included_key(document.as_ref(), include_path) {
                    if state.local(&included).is_none() {
                        let value = self.store.fetch(&included);
                        state.remember(&included, value);
                    }
                }
                return Ok(document);
            }
        };

        if let Some(included) = included_key(document.as_ref(), include_path) {
            if state.local(&included).is_none() {
                state.requests += 1;
                let value = self.store.fetch(&included);
                state.remember(&included, value);
            }
        }

        Ok(document)
    }

    async fn insert(&self, key: &str, document: Value) -> StoreResult<()> {
        let mut state = self.lock();
        // Replacing a document deleted earlier in this session is an upsert.
        let write = match state.pending.get(key) {
            Some(PendingWrite::Delete) => PendingWrite::Store(document),
            _ => PendingWrite::Insert(document),
        };

        tracing::debug!(session_id = %self.id, %key, "document inserted");
        state.queue(key, write)
    }

    async fn store(&self, key: &str, document: Value) -> StoreResult<()> {
        let mut state = self.lock();
        // A pending insert stays an insert.
        let write = match state.pending.get(key) {
            Some(PendingWrite::Insert(_)) => PendingWrite::Insert(document),
            _ => PendingWrite::Store(document),
        };

        tracing::debug!(session_id = %self.id, %key, "document stored");
        state.queue(key, write)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        tracing::debug!(session_id = %self.id, %key, "document deleted");
        self.lock().pending.insert(key.to_string(), PendingWrite::Delete);
        Ok(())
    }

    async fn save_changes(&self) -> StoreResult<()> {
        let mut state = self.lock();
        if state.pending.is_empty() {
            return Ok(());
        }

        state.requests += 1;
        let mut store = self.store.write();

        // Inserts must not collide with committed documents; nothing is applied on conflict.
        for (key, write) in &state.pending {
            if matches!(write, PendingWrite::Insert(_)) && store.documents.contains_key(key) {
                tracing::warn!(session_id = %self.id, %key, "document key conflict");
                return Err(StoreError::conflict(key.clone()));
            }
        }

        let pending = std::mem::take(&mut state.pending);
        let writes = pending.len();
        let now = Utc::now();

        for (key, write) in pending {
            match write {
                PendingWrite::Insert(body) | PendingWrite::Store(body) => {
                    store.last_etag += 1;
                    let etag = store.last_etag;
                    store.documents.insert(
                        key.clone(),
                        StoredDocument {
                            body: body.clone(),
                            etag,
                            last_modified: now,
                        },
                    );
                    state.remember(&key, Some(body));
                }
                PendingWrite::Delete => {
                    store.documents.remove(&key);
                    state.cache.insert(key, None);
                }
            }
        }

        tracing::info!(session_id = %self.id, writes, "changes saved");
        Ok(())
    }
}

fn included_key(document: Option<&Value>, include_path: &str) -> Option<String> {
    document?
        .get(include_path)?
        .as_str()
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}
