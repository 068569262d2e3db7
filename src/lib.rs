//! vaultsubst: Vault secret injection for text files
//!
//! Replaces delimiter-bounded references such as
//! `@@path=kv/storage/postgres/creds,field=username@@` with values read from
//! HashiCorp Vault KV secrets engines, optionally decoded and transformed.
//!
//! # Features
//!
//! - KV version 1 and version 2 mounts
//! - Base64 decoding of stored values
//! - Chainable value transformations (`upper`, `lower`, `trim`, `base64`, `base64d`)
//! - Custom token delimiters
//! - Pluggable secret backends through the [`KvReader`] trait
//!
//! # Example
//!
//! ```no_run
//! use vaultsubst::{ClientBuilder, Patcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("https://vault.example.com:8200")
//!         .token("hvs.example")
//!         .build()?;
//!
//!     let patcher = Patcher::new(vaultsubst::DEFAULT_DELIMITER)?;
//!     let rendered = patcher
//!         .patch("password: @@path=kv/db,field=password,transform=trim@@\n", &client)
//!         .await?;
//!     print!("{}", rendered);
//!
//!     Ok(())
//! }
//! ```

#![deny(
    missing_docs,
    missing_debug_implementations,
    unsafe_code,
    unused_results
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod client;
mod config;
mod endpoints;
mod errors;
mod models;
mod secret_ref;
mod util;

pub mod kv;
pub mod substitute;
pub mod transform;

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig};
pub use errors::{Error, ErrorKind, Result};
pub use kv::KvReader;
pub use models::SecretData;
pub use secret_ref::{KvVersion, SecretRef};
pub use substitute::Patcher;
pub use transform::Transformation;

// Re-export commonly used types
pub use secrecy::SecretString;

/// Crate version, matches Cargo.toml version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Vault address used when `VAULT_ADDR` is unset
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Default token delimiter
pub const DEFAULT_DELIMITER: &str = "@@";
