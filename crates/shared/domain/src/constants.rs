//! Domain-level constants.
//!
//! These constants define the document naming rules shared by every store.

// =============================================================================
// Document collections
// =============================================================================

/// Type tag of the user aggregate collection
pub const USER_COLLECTION: &str = "IdentityUsers";

/// Type tag of the login lookup collection
pub const LOGIN_COLLECTION: &str = "IdentityUserLogins";

/// Separator between a collection prefix and the identifying part of a key
pub const DEFAULT_IDENTITY_PARTS_SEPARATOR: char = '/';

// =============================================================================
// Login keys
// =============================================================================

/// Separator between provider and provider key inside the hashed login encoding
pub const LOGIN_PAIR_SEPARATOR: char = '|';

/// Length of a hex encoded login digest (SHA-256)
pub const LOGIN_DIGEST_HEX_LENGTH: usize = 64;

// =============================================================================
// Document fields
// =============================================================================

/// Field of a login lookup document that references its owner
pub const LOGIN_OWNER_FIELD: &str = "userId";
