//! Data models for Vault KV reads
//!
//! [`SecretData`] is the record handed to the resolver: the key/value map
//! stored in a secret. The remaining types mirror the JSON envelopes of the
//! Vault HTTP API and stay crate-private.

use serde::Deserialize;
use std::collections::HashMap;

/// Key/value data stored in a single secret
///
/// Values may be any JSON scalar or structure, but only strings can be
/// substituted into text.
pub type SecretData = HashMap<String, serde_json::Value>;

/// `GET /v1/{mount}/{path}` response of a KV v1 engine
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KvV1Response {
    /// Secret data
    #[serde(default)]
    pub data: Option<SecretData>,
}

/// `GET /v1/{mount}/data/{path}` response of a KV v2 engine
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KvV2Response {
    /// Versioned wrapper around the secret data
    #[serde(default)]
    pub data: Option<KvV2Data>,
}

/// Inner `data` object of a KV v2 read
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KvV2Data {
    /// Secret data, `null` for deleted or destroyed versions
    #[serde(default)]
    pub data: Option<SecretData>,
    /// Version metadata
    #[serde(default)]
    pub metadata: Option<KvV2Metadata>,
}

/// Metadata of the version returned by a KV v2 read
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KvV2Metadata {
    /// Version number
    #[serde(default)]
    pub version: Option<u64>,
    /// Deletion time, empty when the version is live
    #[serde(default)]
    pub deletion_time: Option<String>,
    /// Whether the version was destroyed
    #[serde(default)]
    pub destroyed: bool,
}

impl KvV2Response {
    /// Unwrap the secret data of a live version
    pub(crate) fn into_secret_data(self) -> Option<SecretData> {
        self.data.and_then(|inner| inner.data)
    }

    /// Whether Vault reports the returned version as deleted or destroyed
    pub(crate) fn is_deleted(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|inner| inner.metadata.as_ref())
            .map(|meta| {
                meta.destroyed || meta.deletion_time.as_deref().is_some_and(|t| !t.is_empty())
            })
            .unwrap_or(false)
    }

    /// Version number reported by Vault, if any
    pub(crate) fn version(&self) -> Option<u64> {
        self.data
            .as_ref()
            .and_then(|inner| inner.metadata.as_ref())
            .and_then(|meta| meta.version)
    }
}
