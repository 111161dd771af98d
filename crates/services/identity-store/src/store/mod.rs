//! Identity store capability traits.
//!
//! Each trait covers one slice of the identity contract, following
//! Interface Segregation: callers depend on the narrow trait they need,
//! and [`IdentityStore`] bundles all of them for a single concrete store.

mod handle;
mod user_store;

pub use handle::{SessionFactory, SessionHandle};
pub use user_store::DocumentUserStore;

use async_trait::async_trait;

use common::StoreResult;
use domain::{IdentityUser, UserClaim, UserLoginInfo};

/// User CRUD and lifecycle.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Assign the user's key from its user name and queue the insert
    async fn create(&self, user: &mut IdentityUser) -> StoreResult<()>;

    /// Queue deletion of the user and of its login lookup entries
    async fn delete(&self, user: &IdentityUser) -> StoreResult<()>;

    /// Find a user by document key; a miss is `Ok(None)`
    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<IdentityUser>>;

    /// Find a user by the user name it was created with
    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<Option<IdentityUser>>;

    /// Queue the current state of the user for the next commit
    async fn update(&self, user: &IdentityUser) -> StoreResult<()>;

    /// Disable the store; every later call fails with `ObjectDisposed`
    fn dispose(&self);
}

/// External logins and the login lookup index.
#[async_trait]
pub trait UserLoginStore: Send + Sync {
    async fn add_login(&self, user: &mut IdentityUser, login: UserLoginInfo) -> StoreResult<()>;

    async fn find_by_login(&self, login: &UserLoginInfo) -> StoreResult<Option<IdentityUser>>;

    async fn get_logins(&self, user: &IdentityUser) -> StoreResult<Vec<UserLoginInfo>>;

    async fn remove_login(&self, user: &mut IdentityUser, login: &UserLoginInfo) -> StoreResult<()>;
}

/// Claims embedded in the user.
#[async_trait]
pub trait UserClaimStore: Send + Sync {
    async fn add_claim(&self, user: &mut IdentityUser, claim: UserClaim) -> StoreResult<()>;

    async fn get_claims(&self, user: &IdentityUser) -> StoreResult<Vec<UserClaim>>;

    async fn remove_claim(&self, user: &mut IdentityUser, claim: &UserClaim) -> StoreResult<()>;
}

/// Role membership, compared ignoring case.
#[async_trait]
pub trait UserRoleStore: Send + Sync {
    async fn add_to_role(&self, user: &mut IdentityUser, role: &str) -> StoreResult<()>;

    async fn get_roles(&self, user: &IdentityUser) -> StoreResult<Vec<String>>;

    async fn is_in_role(&self, user: &IdentityUser, role: &str) -> StoreResult<bool>;

    async fn remove_from_role(&self, user: &mut IdentityUser, role: &str) -> StoreResult<()>;
}

/// Opaque password hash storage. Nothing here hashes or verifies.
#[async_trait]
pub trait UserPasswordStore: Send + Sync {
    async fn get_password_hash(&self, user: &IdentityUser) -> StoreResult<Option<String>>;

    async fn has_password(&self, user: &IdentityUser) -> StoreResult<bool>;

    async fn set_password_hash(
        &self,
        user: &mut IdentityUser,
        password_hash: Option<String>,
    ) -> StoreResult<()>;
}

/// Opaque security stamp storage.
#[async_trait]
pub trait UserSecurityStampStore: Send + Sync {
    async fn get_security_stamp(&self, user: &IdentityUser) -> StoreResult<Option<String>>;

    async fn set_security_stamp(
        &self,
        user: &mut IdentityUser,
        stamp: Option<String>,
    ) -> StoreResult<()>;
}

/// Full identity contract - combines all capabilities
pub trait IdentityStore:
    UserStore
    + UserLoginStore
    + UserClaimStore
    + UserRoleStore
    + UserPasswordStore
    + UserSecurityStampStore
{
}

// Auto-implement IdentityStore for types implementing all traits
impl<T> IdentityStore for T where
    T: UserStore
        + UserLoginStore
        + UserClaimStore
        + UserRoleStore
        + UserPasswordStore
        + UserSecurityStampStore
{
}
