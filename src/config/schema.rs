//! Configuration schema and type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for gwt
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Repository used when no other source names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,
    /// Per-repository settings keyed by repository location
    #[serde(default)]
    pub repos: BTreeMap<String, RepoConfig>,
}

/// Settings for a single repository
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RepoConfig {
    /// Shell commands run inside each newly created worktree
    #[serde(default)]
    pub post_create_commands: Vec<String>,
}
