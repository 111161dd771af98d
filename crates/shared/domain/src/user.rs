//! User aggregate and its embedded value types.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{require, DomainError, DomainResult};
use crate::login::UserLoginInfo;
use crate::set::{contains_by, eq_ignore_case, insert_unique_by, remove_all_by};

/// A claim held by a user: a `(type, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaim {
    pub claim_type: String,
    pub claim_value: String,
}

impl UserClaim {
    pub fn new(claim_type: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        }
    }

    /// The claim type is required, the value may be empty.
    pub fn validate(&self) -> DomainResult<()> {
        require("claim_type", &self.claim_type)
    }

    /// Exact pair equality.
    pub fn matches(&self, other: &UserClaim) -> bool {
        self.claim_type == other.claim_type && self.claim_value == other.claim_value
    }
}

/// User aggregate as stored in the document database.
///
/// `roles`, `claims` and `logins` never hold duplicates under their own
/// equality rules; they are only reachable through the methods below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    id: String,
    pub user_name: String,
    pub password_hash: Option<String>,
    pub security_stamp: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    claims: Vec<UserClaim>,
    #[serde(default)]
    logins: Vec<UserLoginInfo>,
}

impl IdentityUser {
    /// Create a not yet persisted user.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Default::default()
        }
    }

    /// Document key, empty until the user is created.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if the user has been assigned a document key
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Assign the document key. The key never changes once set.
    pub fn assign_id(&mut self, id: impl Into<String>) -> DomainResult<()> {
        let id = id.into();
        require("id", &id)?;

        if self.is_persisted() && self.id != id {
            return Err(DomainError::validation(format!(
                "user already has id {}, refusing to change it to {}",
                self.id, id
            )));
        }

        self.id = id;
        Ok(())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Case-insensitive membership test.
    pub fn has_role(&self, role: &str) -> bool {
        contains_by(&self.roles, role, |stored: &String, target: &str| {
            eq_ignore_case(stored, target)
        })
    }

    /// Add a role unless present under any casing; the first casing is kept.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        insert_unique_by(&mut self.roles, role.into(), |a, b| eq_ignore_case(a, b))
    }

    /// Remove every role equal to `role` ignoring case.
    pub fn remove_role(&mut self, role: &str) -> usize {
        remove_all_by(&mut self.roles, role, |stored: &String, target: &str| {
            eq_ignore_case(stored, target)
        })
    }

    // =========================================================================
    // Claims
    // =========================================================================

    pub fn claims(&self) -> &[UserClaim] {
        &self.claims
    }

    pub fn has_claim(&self, claim: &UserClaim) -> bool {
        contains_by(&self.claims, claim, UserClaim::matches)
    }

    pub fn add_claim(&mut self, claim: UserClaim) -> bool {
        insert_unique_by(&mut self.claims, claim, UserClaim::matches)
    }

    pub fn remove_claim(&mut self, claim: &UserClaim) -> usize {
        remove_all_by(&mut self.claims, claim, UserClaim::matches)
    }

    // =========================================================================
    // Logins
    // =========================================================================

    pub fn logins(&self) -> &[UserLoginInfo] {
        &self.logins
    }

    pub fn has_login(&self, login: &UserLoginInfo) -> bool {
        contains_by(&self.logins, login, UserLoginInfo::matches)
    }

    pub fn add_login(&mut self, login: UserLoginInfo) -> bool {
        insert_unique_by(&mut self.logins, login, UserLoginInfo::matches)
    }

    pub fn remove_login(&mut self, login: &UserLoginInfo) -> usize {
        remove_all_by(&mut self.logins, login, UserLoginInfo::matches)
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// A user created only through external logins has no password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

impl Document for IdentityUser {
    fn key(&self) -> &str {
        &self.id
    }
}
