//! Marker for values persisted as documents.

use serde::{de::DeserializeOwned, Serialize};

/// A value stored under its own document key.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Key the document is stored under (empty until assigned).
    fn key(&self) -> &str;
}
