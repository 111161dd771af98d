//! Shared configuration structures.

use domain::{KeyConventions, DEFAULT_IDENTITY_PARTS_SEPARATOR, LOGIN_COLLECTION, USER_COLLECTION};
use serde::{Deserialize, Serialize};

/// Document naming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConventionsConfig {
    /// Type tag of user documents
    pub user_collection: String,
    /// Type tag of login lookup documents
    pub login_collection: String,
    /// Separator between collection prefix and identifying part
    pub identity_parts_separator: char,
}

impl Default for ConventionsConfig {
    fn default() -> Self {
        Self {
            user_collection: USER_COLLECTION.to_string(),
            login_collection: LOGIN_COLLECTION.to_string(),
            identity_parts_separator: DEFAULT_IDENTITY_PARTS_SEPARATOR,
        }
    }
}

impl From<&ConventionsConfig> for KeyConventions {
    fn from(config: &ConventionsConfig) -> Self {
        KeyConventions {
            identity_parts_separator: config.identity_parts_separator,
            user_collection: config.user_collection.clone(),
            login_collection: config.login_collection.clone(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level / `EnvFilter` directive
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
