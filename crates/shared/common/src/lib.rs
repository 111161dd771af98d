//! Common utilities shared across the identity store crates.
//!
//! This crate provides:
//! - The store error taxonomy
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{StoreError, StoreResult};
