//! Identity store configuration.

use std::env;

use common::{ConventionsConfig, LoggingConfig};
use domain::KeyConventions;

/// Identity store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStoreConfig {
    /// Document naming rules
    pub conventions: ConventionsConfig,
    /// Log filter for the binary
    pub logging: LoggingConfig,
}

impl IdentityStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ConventionsConfig::default();

        let conventions = ConventionsConfig {
            user_collection: lookup("IDENTITY_STORE_USER_COLLECTION")
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.user_collection),
            login_collection: lookup("IDENTITY_STORE_LOGIN_COLLECTION")
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.login_collection),
            identity_parts_separator: lookup("IDENTITY_STORE_SEPARATOR")
                .and_then(|value| single_char(&value))
                .unwrap_or(defaults.identity_parts_separator),
        };

        let logging = LoggingConfig {
            log_level: lookup("IDENTITY_STORE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| LoggingConfig::default().log_level),
        };

        Self {
            conventions,
            logging,
        }
    }

    pub fn key_conventions(&self) -> KeyConventions {
        KeyConventions::from(&self.conventions)
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => {
            tracing::warn!(
                %value,
                "IDENTITY_STORE_SEPARATOR must be a single character, using default"
            );
            None
        }
    }
}
