use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{BoardError, Result};

/// Runtime configuration. Every field is optional; conventions fill the
/// gaps so a missing or partial file still yields a working setup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Tenant scope prefixed onto every collection path.
    pub app_id: Option<String>,
    /// Fixed user id. When absent, identity comes from the provider
    /// (locally generated for the in-memory fallback).
    pub user_id: Option<String>,
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self {
            app_id: Some("corkboard".to_string()),
            user_id: None,
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("{path}: {e}")))?;
        serde_json::from_str(&raw).map_err(|e| BoardError::Config(format!("{path}: {e}")))
    }

    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or("corkboard")
    }
}
