//! External login descriptors and their lookup documents.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{require, DomainResult};

/// An external login: the provider name plus the key the provider issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
}

impl UserLoginInfo {
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            provider_key: provider_key.into(),
        }
    }

    /// Both halves of the pair are required.
    pub fn validate(&self) -> DomainResult<()> {
        require("login_provider", &self.login_provider)?;
        require("provider_key", &self.provider_key)
    }

    /// Exact, case-sensitive pair equality.
    pub fn matches(&self, other: &UserLoginInfo) -> bool {
        self.login_provider == other.login_provider && self.provider_key == other.provider_key
    }
}

/// Secondary document resolving an external login back to its owner.
///
/// One per login; created and deleted only alongside the owner's `logins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginIndexEntry {
    pub id: String,
    /// Key of the owning user document
    pub user_id: String,
    pub login_provider: String,
    pub provider_key: String,
}

impl LoginIndexEntry {
    pub fn new(id: String, user_id: impl Into<String>, login: &UserLoginInfo) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            login_provider: login.login_provider.clone(),
            provider_key: login.provider_key.clone(),
        }
    }

    pub fn login(&self) -> UserLoginInfo {
        UserLoginInfo::new(self.login_provider.clone(), self.provider_key.clone())
    }
}

impl Document for LoginIndexEntry {
    fn key(&self) -> &str {
        &self.id
    }
}
