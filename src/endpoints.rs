//! Vault API URL construction

use crate::util::{encode_path, encode_secret_path};

/// Vault HTTP API base path
pub const API_V1_BASE: &str = "/v1";

/// Endpoint builder
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Create a new endpoints builder
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the full URL for a path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // KV version 1
    pub fn kv_v1(&self, mount: &str, path: &str) -> String {
        self.url(&format!(
            "{}/{}/{}",
            API_V1_BASE,
            encode_path(mount),
            encode_secret_path(path)
        ))
    }

    // KV version 2
    pub fn kv_v2(&self, mount: &str, path: &str) -> String {
        self.url(&format!(
            "{}/{}/data/{}",
            API_V1_BASE,
            encode_path(mount),
            encode_secret_path(path)
        ))
    }
}
