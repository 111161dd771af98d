//! Domain layer - identity aggregate and document naming.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the user aggregate, its embedded claims/roles/logins, the login lookup
//! document and the key derivation rules shared by every document store.

pub mod constants;
pub mod document;
pub mod error;
pub mod keys;
pub mod login;
pub mod set;
pub mod user;

pub use constants::*;
pub use document::Document;
pub use error::{DomainError, DomainResult};
pub use keys::{derive_login_key, derive_user_key, document_key_prefix, KeyConventions};
pub use login::{LoginIndexEntry, UserLoginInfo};
pub use user::{IdentityUser, UserClaim};
