//! Document key derivation.
//!
//! Users and login lookups are addressed by keys computed from their
//! identifying values, so every lookup is a load-by-key instead of a query.

use sha2::{Digest, Sha256};

use crate::constants::{
    DEFAULT_IDENTITY_PARTS_SEPARATOR, LOGIN_COLLECTION, LOGIN_PAIR_SEPARATOR, USER_COLLECTION,
};
use crate::login::UserLoginInfo;

/// Key of a user document: `prefix + separator + user_name`.
///
/// The user name is used verbatim. Callers wanting case-insensitive
/// user names must normalize before deriving.
pub fn derive_user_key(user_name: &str, prefix: &str, separator: char) -> String {
    format!("{prefix}{separator}{user_name}")
}

/// Hex encoded SHA-256 of the `(provider, key)` pair.
///
/// The provider is length-prefixed before hashing, so `("a|b", "c")` and
/// `("a", "b|c")` feed different bytes to the digest.
pub fn derive_login_key(login_provider: &str, provider_key: &str) -> String {
    let mut separator = [0u8; 4];
    let mut hasher = Sha256::new();
    hasher.update(login_provider.len().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(login_provider.as_bytes());
    hasher.update(LOGIN_PAIR_SEPARATOR.encode_utf8(&mut separator).as_bytes());
    hasher.update(provider_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Turn a type tag into a document key prefix.
///
/// Tags with at most one upper-case character are lower-cased
/// (`Users` -> `users`); anything else is kept as written.
pub fn document_key_prefix(type_tag: &str) -> String {
    let upper = type_tag.chars().filter(|c| c.is_uppercase()).count();
    if upper <= 1 {
        type_tag.to_lowercase()
    } else {
        type_tag.to_string()
    }
}

/// Naming rules of the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConventions {
    /// Separator between the collection prefix and the identifying part
    pub identity_parts_separator: char,
    /// Type tag of user documents
    pub user_collection: String,
    /// Type tag of login lookup documents
    pub login_collection: String,
}

impl Default for KeyConventions {
    fn default() -> Self {
        Self {
            identity_parts_separator: DEFAULT_IDENTITY_PARTS_SEPARATOR,
            user_collection: USER_COLLECTION.to_string(),
            login_collection: LOGIN_COLLECTION.to_string(),
        }
    }
}

impl KeyConventions {
    pub fn user_key_prefix(&self) -> String {
        document_key_prefix(&self.user_collection)
    }

    pub fn login_key_prefix(&self) -> String {
        document_key_prefix(&self.login_collection)
    }

    /// Document key of the user named `user_name`.
    pub fn user_key(&self, user_name: &str) -> String {
        derive_user_key(user_name, &self.user_key_prefix(), self.identity_parts_separator)
    }

    /// Document key of the lookup entry for `login`.
    pub fn login_key(&self, login: &UserLoginInfo) -> String {
        format!(
            "{}{}{}",
            self.login_key_prefix(),
            self.identity_parts_separator,
            derive_login_key(&login.login_provider, &login.provider_key)
        )
    }
}
