//! Identity store backed by a document session.
//!
//! Users are stored under keys derived from their user names; every
//! external login also gets a lookup document keyed by a hash of the
//! login, so resolving a login is a single load by key. Both writes of a
//! login change are queued on the same session and committed together
//! by the caller. A lookup document is only ever written or deleted on
//! behalf of the user it names.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use common::{StoreError, StoreResult};
use domain::error::require;
use domain::{IdentityUser, LoginIndexEntry, UserClaim, UserLoginInfo, LOGIN_OWNER_FIELD};

use super::handle::SessionHandle;
use super::{
    UserClaimStore, UserLoginStore, UserPasswordStore, UserRoleStore, UserSecurityStampStore,
    UserStore,
};
use crate::session::{decode, insert_document, store_document, DocumentSession};

const STORE_NAME: &str = "DocumentUserStore";

/// [`IdentityStore`](super::IdentityStore) over a [`DocumentSession`].
///
/// Not meant to be shared between concurrent units of work: one store,
/// one session, one commit.
pub struct DocumentUserStore<S> {
    handle: SessionHandle<S>,
    disposed: AtomicBool,
}

impl<S: DocumentSession> DocumentUserStore<S> {
    /// Create a store bound to an open session
    pub fn new(session: S) -> Self {
        Self {
            handle: SessionHandle::direct(session),
            disposed: AtomicBool::new(false),
        }
    }

    /// Create a store that opens its session on first use
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> StoreResult<S> + Send + Sync + 'static,
    {
        Self {
            handle: SessionHandle::lazy(factory),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Check if the session has been opened yet
    pub fn has_session(&self) -> bool {
        self.handle.is_acquired()
    }

    /// The bound session, so the caller can commit its pending writes.
    pub fn session(&self) -> StoreResult<&S> {
        self.active_session()
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.is_disposed() {
            return Err(StoreError::disposed(STORE_NAME));
        }
        Ok(())
    }

    fn active_session(&self) -> StoreResult<&S> {
        self.ensure_active()?;
        self.handle.get()
    }

    /// Queue the user's current state if it has been created.
    ///
    /// The session does not alias the caller's value, so every change to
    /// a persisted user is re-queued here.
    async fn track(&self, user: &IdentityUser) -> StoreResult<()> {
        if !user.is_persisted() {
            return Ok(());
        }
        store_document(self.active_session()?, user).await
    }

    /// Queue deletion of the lookup entry at `key` if `user` owns it.
    async fn release_login(session: &S, key: &str, user: &IdentityUser) -> StoreResult<()> {
        let entry: Option<LoginIndexEntry> = decode(session.load(key).await?)?;
        match entry {
            Some(entry) if entry.user_id == user.id() => session.delete(key).await,
            Some(entry) => {
                tracing::warn!(
                    %key,
                    owner = %entry.user_id,
                    user_id = %user.id(),
                    "login entry owned by another user, keeping it"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: DocumentSession> UserStore for DocumentUserStore<S> {
    async fn create(&self, user: &mut IdentityUser) -> StoreResult<()> {
        self.ensure_active()?;
        require("user_name", &user.user_name)?;

        let session = self.active_session()?;
        let key = session.conventions().user_key(&user.user_name);
        user.assign_id(key)?;

        tracing::debug!(user_id = %user.id(), "creating user");
        insert_document(session, &*user).await
    }

    async fn delete(&self, user: &IdentityUser) -> StoreResult<()> {
        self.ensure_active()?;
        require("id", user.id())?;

        let session = self.active_session()?;
        for login in user.logins() {
            let key = session.conventions().login_key(login);
            Self::release_login(session, &key, user).await?;
        }

        tracing::debug!(
            user_id = %user.id(),
            logins = user.logins().len(),
            "deleting user"
        );
        session.delete(user.id()).await
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<IdentityUser>> {
        self.ensure_active()?;
        require("user_id", user_id)?;

        let session = self.active_session()?;
        decode(session.load(user_id).await?)
    }

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<Option<IdentityUser>> {
        self.ensure_active()?;
        require("user_name", user_name)?;

        let key = self.active_session()?.conventions().user_key(user_name);
        self.find_by_id(&key).await
    }

    async fn update(&self, user: &IdentityUser) -> StoreResult<()> {
        self.ensure_active()?;
        require("id", user.id())?;

        self.track(user).await
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            tracing::debug!("identity store disposed");
        }
    }
}

#[async_trait]
impl<S: DocumentSession> UserLoginStore for DocumentUserStore<S> {
    async fn add_login(&self, user: &mut IdentityUser, login: UserLoginInfo) -> StoreResult<()> {
        self.ensure_active()?;
        require("id", user.id())?;
        login.validate()?;

        if user.has_login(&login) {
            return Ok(());
        }

        let session = self.active_session()?;
        let key = session.conventions().login_key(&login);

        let current: Option<LoginIndexEntry> = decode(session.load(&key).await?)?;
        let entry = LoginIndexEntry::new(key, user.id(), &login);
        match current {
            Some(current) if current.user_id != user.id() => {
                tracing::warn!(
                    key = %entry.id,
                    owner = %current.user_id,
                    user_id = %user.id(),
                    "login already belongs to another user"
                );
                return Err(StoreError::conflict(entry.id));
            }
            // Left over from an earlier write of this user.
            Some(_) => store_document(session, &entry).await?,
            None => insert_document(session, &entry).await?,
        }

        tracing::debug!(
            user_id = %user.id(),
            provider = %login.login_provider,
            key = %entry.id,
            "adding login"
        );

        // Only once the lookup entry is queued.
        user.add_login(login);
        self.track(user).await
    }

    async fn find_by_login(&self, login: &UserLoginInfo) -> StoreResult<Option<IdentityUser>> {
        self.ensure_active()?;
        login.validate()?;

        let session = self.active_session()?;
        let key = session.conventions().login_key(login);

        let entry: Option<LoginIndexEntry> =
            decode(session.load_with_include(&key, LOGIN_OWNER_FIELD).await?)?;
        let Some(entry) = entry else {
            return Ok(None);
        };

        // Already in the session cache thanks to the include.
        let user: Option<IdentityUser> = decode(session.load(&entry.user_id).await?)?;
        if user.is_none() {
            tracing::warn!(
                %key,
                user_id = %entry.user_id,
                "login entry points to a missing user"
            );
        }

        Ok(user)
    }

    async fn get_logins(&self, user: &IdentityUser) -> StoreResult<Vec<UserLoginInfo>> {
        self.ensure_active()?;
        Ok(user.logins().to_vec())
    }

    async fn remove_login(
        &self,
        user: &mut IdentityUser,
        login: &UserLoginInfo,
    ) -> StoreResult<()> {
        self.ensure_active()?;
        require("id", user.id())?;
        login.validate()?;

        let session = self.active_session()?;
        let key = session.conventions().login_key(login);
        Self::release_login(session, &key, user).await?;

        if user.remove_login(login) > 0 {
            self.track(user).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentSession> UserClaimStore for DocumentUserStore<S> {
    async fn add_claim(&self, user: &mut IdentityUser, claim: UserClaim) -> StoreResult<()> {
        self.ensure_active()?;
        claim.validate()?;

        if user.add_claim(claim) {
            self.track(user).await?;
        }
        Ok(())
    }

    async fn get_claims(&self, user: &IdentityUser) -> StoreResult<Vec<UserClaim>> {
        self.ensure_active()?;
        Ok(user.claims().to_vec())
    }

    async fn remove_claim(&self, user: &mut IdentityUser, claim: &UserClaim) -> StoreResult<()> {
        self.ensure_active()?;
        claim.validate()?;

        if user.remove_claim(claim) > 0 {
            self.track(user).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentSession> UserRoleStore for DocumentUserStore<S> {
    async fn add_to_role(&self, user: &mut IdentityUser, role: &str) -> StoreResult<()> {
        self.ensure_active()?;
        require("role", role)?;

        if user.add_role(role) {
            self.track(user).await?;
        }
        Ok(())
    }

    async fn get_roles(&self, user: &IdentityUser) -> StoreResult<Vec<String>> {
        self.ensure_active()?;
        Ok(user.roles().to_vec())
    }

    async fn is_in_role(&self, user: &IdentityUser, role: &str) -> StoreResult<bool> {
        self.ensure_active()?;
        require("role", role)?;
        Ok(user.has_role(role))
    }

    async fn remove_from_role(&self, user: &mut IdentityUser, role: &str) -> StoreResult<()> {
        self.ensure_active()?;
        require("role", role)?;

        if user.remove_role(role) > 0 {
            self.track(user).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentSession> UserPasswordStore for DocumentUserStore<S> {
    async fn get_password_hash(&self, user: &IdentityUser) -> StoreResult<Option<String>> {
        self.ensure_active()?;
        Ok(user.password_hash.clone())
    }

    async fn has_password(&self, user: &IdentityUser) -> StoreResult<bool> {
        self.ensure_active()?;
        Ok(user.has_password())
    }

    async fn set_password_hash(
        &self,
        user: &mut IdentityUser,
        password_hash: Option<String>,
    ) -> StoreResult<()> {
        self.ensure_active()?;
        user.password_hash = password_hash;
        self.track(user).await
    }
}

#[async_trait]
impl<S: DocumentSession> UserSecurityStampStore for DocumentUserStore<S> {
    async fn get_security_stamp(&self, user: &IdentityUser) -> StoreResult<Option<String>> {
        self.ensure_active()?;
        Ok(user.security_stamp.clone())
    }

    async fn set_security_stamp(
        &self,
        user: &mut IdentityUser,
        stamp: Option<String>,
    ) -> StoreResult<()> {
        self.ensure_active()?;
        user.security_stamp = stamp;
        self.track(user).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use super::*;
    use crate::session::MockDocumentSession;
    use crate::store::IdentityStore;
    use domain::KeyConventions;

    fn persisted_user(name: &str) -> IdentityUser {
        let mut user = IdentityUser::new(name);
        user.assign_id(KeyConventions::default().user_key(name)).unwrap();
        user
    }

    /// Mock with no expectations: any session call panics the test.
    fn untouched_session() -> MockDocumentSession {
        MockDocumentSession::new()
    }

    #[tokio::test]
    async fn test_disposed_store_rejects_everything() {
        let store = DocumentUserStore::new(untouched_session());
        store.dispose();
        store.dispose();

        let mut user = persisted_user("alice");
        let login = UserLoginInfo::new("google", "g123");
        let claim = UserClaim::new("email", "alice@example.com");

        assert!(store.create(&mut user).await.unwrap_err().is_disposed());
        assert!(store.delete(&user).await.unwrap_err().is_disposed());
        assert!(store.update(&user).await.unwrap_err().is_disposed());
        assert!(store.find_by_id(user.id()).await.unwrap_err().is_disposed());
        assert!(store.find_by_user_name("alice").await.unwrap_err().is_disposed());
        assert!(store.add_login(&mut user, login.clone()).await.unwrap_err().is_disposed());
        assert!(store.find_by_login(&login).await.unwrap_err().is_disposed());
        assert!(store.get_logins(&user).await.unwrap_err().is_disposed());
        assert!(store.remove_login(&mut user, &login).await.unwrap_err().is_disposed());
        assert!(store.add_claim(&mut user, claim.clone()).await.unwrap_err().is_disposed());
        assert!(store.get_claims(&user).await.unwrap_err().is_disposed());
        assert!(store.remove_claim(&mut user, &claim).await.unwrap_err().is_disposed());
        assert!(store.add_to_role(&mut user, "Admin").await.unwrap_err().is_disposed());
        assert!(store.get_roles(&user).await.unwrap_err().is_disposed());
        assert!(store.is_in_role(&user, "Admin").await.unwrap_err().is_disposed());
        assert!(store.remove_from_role(&mut user, "Admin").await.unwrap_err().is_disposed());
        assert!(store.get_password_hash(&user).await.unwrap_err().is_disposed());
        assert!(store.has_password(&user).await.unwrap_err().is_disposed());
        assert!(store.set_password_hash(&mut user, None).await.unwrap_err().is_disposed());
        assert!(store.get_security_stamp(&user).await.unwrap_err().is_disposed());
        assert!(store.set_security_stamp(&mut user, None).await.unwrap_err().is_disposed());
        assert!(store.session().unwrap_err().is_disposed());

        // Nothing was mutated by the rejected calls.
        assert!(user.logins().is_empty());
        assert!(user.claims().is_empty());
        assert!(user.roles().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_touch_nothing() {
        let store = DocumentUserStore::new(untouched_session());
        let mut unnamed = IdentityUser::new("");
        let mut fresh = IdentityUser::new("alice");

        assert!(store.create(&mut unnamed).await.unwrap_err().is_invalid_argument());
        assert!(!unnamed.is_persisted());

        assert!(store.delete(&fresh).await.unwrap_err().is_invalid_argument());
        assert!(store.update(&fresh).await.unwrap_err().is_invalid_argument());
        assert!(store.find_by_id("").await.unwrap_err().is_invalid_argument());
        assert!(store.find_by_user_name(" ").await.unwrap_err().is_invalid_argument());

        let err = store
            .add_login(&mut fresh, UserLoginInfo::new("google", "g123"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(fresh.logins().is_empty());

        let mut user = persisted_user("bob");
        let err = store
            .add_login(&mut user, UserLoginInfo::new("", "g123"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = store
            .add_claim(&mut user, UserClaim::new("", "value"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(store.add_to_role(&mut user, "").await.unwrap_err().is_invalid_argument());
        let err = store
            .find_by_login(&UserLoginInfo::new("google", ""))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        assert!(user.logins().is_empty());
        assert!(user.claims().is_empty());
        assert!(user.roles().is_empty());
    }

    #[tokio::test]
    async fn test_unpersisted_user_mutations_stay_in_memory() {
        let store = DocumentUserStore::new(untouched_session());
        let mut user = IdentityUser::new("alice");

        store.add_to_role(&mut user, "Admin").await.unwrap();
        store.add_claim(&mut user, UserClaim::new("email", "a@example.com")).await.unwrap();
        store.set_password_hash(&mut user, Some("hash".into())).await.unwrap();

        assert!(store.is_in_role(&user, "admin").await.unwrap());
        assert!(store.has_password(&user).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_assigns_key_and_queues_user() {
        let mut session = MockDocumentSession::new();
        session.expect_conventions().return_const(KeyConventions::default());
        session
            .expect_insert()
            .withf(|key, document| {
                let key: &str = key;
                key == "IdentityUsers/alice" && document["id"] == "IdentityUsers/alice"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let store = DocumentUserStore::new(session);
        let mut user = IdentityUser::new("alice");
        store.create(&mut user).await.unwrap();

        assert_eq!(user.id(), "IdentityUsers/alice");
    }

    fn is_login_key(key: &str) -> bool {
        key.starts_with("IdentityUserLogins/")
    }

    #[tokio::test]
    async fn test_add_login_queues_entry_and_user() {
        let mut session = MockDocumentSession::new();
        session.expect_conventions().return_const(KeyConventions::default());
        session
            .expect_load()
            .withf(|key| is_login_key(key))
            .times(1)
            .returning(|_| Ok(None));
        session
            .expect_insert()
            .withf(|key, document| {
                is_login_key(key) && document["userId"] == "IdentityUsers/alice"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        session
            .expect_store()
            .withf(|key, _| {
                let key: &str = key;
                key == "IdentityUsers/alice"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let store = DocumentUserStore::new(session);
        let mut user = persisted_user("alice");
        let login = UserLoginInfo::new("google", "g123");

        store.add_login(&mut user, login.clone()).await.unwrap();
        // Second add is a no-op: the mock would reject extra writes.
        store.add_login(&mut user, login).await.unwrap();

        assert_eq!(user.logins().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_entry_write_leaves_user_unchanged() {
        let mut session = MockDocumentSession::new();
        session.expect_conventions().return_const(KeyConventions::default());
        session.expect_load().times(2).returning(|_| Ok(None));
        session
            .expect_insert()
            .times(2)
            .returning(|_, _| Err(StoreError::session("boom")));

        let store = DocumentUserStore::new(session);
        let mut user = persisted_user("alice");
        let login = UserLoginInfo::new("google", "g123");

        assert!(store.add_login(&mut user, login.clone()).await.is_err());
        assert!(user.logins().is_empty());

        // A retry writes the entry again instead of short-circuiting.
        assert!(store.add_login(&mut user, login).await.is_err());
        assert!(user.logins().is_empty());
    }

    #[tokio::test]
    async fn test_add_login_owned_by_another_user() {
        let mut session = MockDocumentSession::new();
        session.expect_conventions().return_const(KeyConventions::default());
        session.expect_load().times(1).returning(|key| {
            let entry = LoginIndexEntry::new(
                key.to_string(),
                "IdentityUsers/bob",
                &UserLoginInfo::new("google", "g123"),
            );
            Ok(Some(serde_json::to_value(entry).unwrap()))
        });

        let store = DocumentUserStore::new(session);
        let mut user = persisted_user("alice");

        let err = store
            .add_login(&mut user, UserLoginInfo::new("google", "g123"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref key) if is_login_key(key)));
        assert!(user.logins().is_empty());
    }

    #[tokio::test]
    async fn test_session_errors_propagate() {
        let mut session = MockDocumentSession::new();
        session.expect_conventions().return_const(KeyConventions::default());
        session
            .expect_load()
            .returning(|_| Err(StoreError::session("connection refused")));

        let store = DocumentUserStore::new(session);
        let err = store.find_by_user_name("alice").await.unwrap_err();

        assert!(matches!(err, StoreError::Session(ref msg) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn test_factory_not_called_for_in_memory_operations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let store = DocumentUserStore::with_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(untouched_session())
        });

        let user = persisted_user("alice");
        store.get_roles(&user).await.unwrap();
        store.get_claims(&user).await.unwrap();
        store.has_password(&user).await.unwrap();

        assert!(!store.has_session());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    fn assert_identity_store<T: IdentityStore>(_: &T) {}

    #[test]
    fn test_document_user_store_is_identity_store() {
        let store = DocumentUserStore::new(untouched_session());
        assert_identity_store(&store);
    }
}
