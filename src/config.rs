//! Configuration module
//!
//! This module handles loading and persisting gwt configuration from TOML files.

pub mod loader;
pub mod schema;

pub use loader::ConfigStore;
pub use schema::{Config, RepoConfig};
