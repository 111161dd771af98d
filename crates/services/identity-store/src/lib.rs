//! Identity Store Library
//!
//! Persists user identities (accounts, external logins, claims, roles,
//! password hashes, security stamps) in a document database through a
//! unit-of-work session. The store only queues writes; the caller commits.

pub mod config;
pub mod session;
pub mod store;

use std::sync::Arc;

use serde_json::Value;

use common::StoreResult;
use domain::{IdentityUser, UserClaim, UserLoginInfo};

use crate::config::IdentityStoreConfig;
use crate::session::{DocumentSession, InMemoryDocumentStore};
use crate::store::{
    DocumentUserStore, UserClaimStore, UserLoginStore, UserPasswordStore, UserRoleStore,
    UserSecurityStampStore, UserStore,
};

pub use store::IdentityStore;

/// Everything needed to create one user with its embedded data.
#[derive(Debug, Clone, Default)]
pub struct SeedRequest {
    pub user_name: String,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    pub roles: Vec<String>,
    pub claims: Vec<UserClaim>,
    pub logins: Vec<UserLoginInfo>,
}

/// Create a user in a fresh in-memory store, commit, and return every
/// stored document ordered by key.
pub async fn seed(
    config: &IdentityStoreConfig,
    request: SeedRequest,
) -> StoreResult<Vec<(String, Value)>> {
    let documents = InMemoryDocumentStore::with_conventions(config.key_conventions());
    let session = Arc::new(documents.open_session());
    let store = DocumentUserStore::new(session.clone());

    let mut user = IdentityUser::new(request.user_name);
    store.create(&mut user).await?;
    store.set_password_hash(&mut user, request.password_hash).await?;
    store.set_security_stamp(&mut user, request.security_stamp).await?;

    for role in &request.roles {
        store.add_to_role(&mut user, role).await?;
    }
    for claim in request.claims {
        store.add_claim(&mut user, claim).await?;
    }
    for login in request.logins {
        store.add_login(&mut user, login).await?;
    }

    session.save_changes().await?;
    store.dispose();

    tracing::info!(
        user_id = %user.id(),
        documents = documents.document_count(),
        "user seeded"
    );
    Ok(documents.documents())
}
