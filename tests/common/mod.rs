//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use vaultsubst::{KvReader, Result, SecretData};

/// In-memory KV store keyed by `(mount, path)`, one map per engine version
#[derive(Debug, Default)]
pub struct MemoryKv {
    v1: HashMap<(String, String), SecretData>,
    v2: HashMap<(String, String), SecretData>,
    reads: AtomicUsize,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_v1(mut self, mount: &str, path: &str, fields: &[(&str, Value)]) -> Self {
        let _ = self
            .v1
            .insert((mount.to_string(), path.to_string()), record(fields));
        self
    }

    pub fn with_v2(mut self, mount: &str, path: &str, fields: &[(&str, Value)]) -> Self {
        let _ = self
            .v2
            .insert((mount.to_string(), path.to_string()), record(fields));
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

fn record(fields: &[(&str, Value)]) -> SecretData {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[async_trait]
impl KvReader for MemoryKv {
    async fn read_kv_v1(&self, mount: &str, path: &str) -> Result<Option<SecretData>> {
        let _ = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.v1.get(&(mount.to_string(), path.to_string())).cloned())
    }

    async fn read_kv_v2(&self, mount: &str, path: &str) -> Result<Option<SecretData>> {
        let _ = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.v2.get(&(mount.to_string(), path.to_string())).cloned())
    }
}
