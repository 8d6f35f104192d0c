// API Configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// API keys (key -> permission level); empty disables authentication
    pub api_keys: HashMap<String, Permission>,

    /// Enable CORS
    pub enable_cors: bool,

    /// Serve the OpenAPI document at /api/openapi.json
    pub enable_openapi: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Can read the latest report
    ReadOnly,

    /// Can also trigger checks
    Operator,
}

impl Permission {
    /// Whether this permission may start a run
    pub fn can_trigger(&self) -> bool {
        matches!(self, Permission::Operator)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_keys: HashMap::new(),
            enable_cors: true,
            enable_openapi: true,
        }
    }
}

impl ApiConfig {
    /// Whether requests must carry an API key
    pub fn auth_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Validate API key and return permission level
    pub fn validate_key(&self, key: &str) -> Option<Permission> {
        self.api_keys.get(key).copied()
    }

    /// Add API key
    pub fn add_key(&mut self, key: String, permission: Permission) {
        self.api_keys.insert(key, permission);
    }

    /// Listen address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
