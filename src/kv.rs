//! Resolving secret references against a KV store
//!
//! The store is abstracted behind [`KvReader`], so the resolver works the
//! same against the HTTP [`Client`](crate::Client) and against in-memory
//! test doubles.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use vaultsubst::{kv, KvReader, Result, SecretData, SecretRef};
//!
//! #[derive(Debug)]
//! struct Fixed;
//!
//! #[async_trait]
//! impl KvReader for Fixed {
//!     async fn read_kv_v1(&self, _mount: &str, _path: &str) -> Result<Option<SecretData>> {
//!         Ok(None)
//!     }
//!
//!     async fn read_kv_v2(&self, _mount: &str, _path: &str) -> Result<Option<SecretData>> {
//!         let mut data = SecretData::new();
//!         data.insert("user".to_string(), "  admin ".into());
//!         Ok(Some(data))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let secret_ref: SecretRef = "path=kv/app,field=user,transform=trim|upper".parse().unwrap();
//! assert_eq!(kv::resolve(&secret_ref, &Fixed).await.unwrap(), "ADMIN");
//! # });
//! ```

use crate::{
    errors::{Error, Result},
    models::SecretData,
    secret_ref::{KvVersion, SecretRef},
};
use async_trait::async_trait;
use tracing::debug;

/// Read access to KV secrets engines
///
/// Both methods take the mount name and the path below it, and return
/// `Ok(None)` when no secret exists there.
#[async_trait]
pub trait KvReader: Send + Sync {
    /// Read a secret from a KV version 1 mount
    async fn read_kv_v1(&self, mount: &str, path: &str) -> Result<Option<SecretData>>;

    /// Read a secret from a KV version 2 mount
    async fn read_kv_v2(&self, mount: &str, path: &str) -> Result<Option<SecretData>>;
}

/// Split a secret path into its mount and the path below it
///
/// Both `kv` and `kv/` are rejected, a sub-path is mandatory.
///
/// ```
/// assert_eq!(vaultsubst::kv::split_mount("kv/a/b").unwrap(), ("kv", "a/b"));
/// assert!(vaultsubst::kv::split_mount("kv/").is_err());
/// ```
pub fn split_mount(path: &str) -> Result<(&str, &str)> {
    let mut segments = path.split('/');
    let mount = segments.next().unwrap_or_default();
    match segments.next() {
        Some(second) if !second.is_empty() => {}
        _ => {
            return Err(Error::MissingSubpath {
                mount: mount.to_string(),
            })
        }
    }
    let sub_path = path
        .strip_prefix(mount)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or_default();
    Ok((mount, sub_path))
}

/// Read the raw secret data a reference points at
///
/// Dispatches to the v1 or v2 read depending on the reference's version.
/// Unknown versions are rejected here, never while parsing.
pub async fn read_kv<R>(secret_ref: &SecretRef, reader: &R) -> Result<Option<SecretData>>
where
    R: KvReader + ?Sized,
{
    let (mount, path) = split_mount(&secret_ref.path)?;
    debug!("Reading secret mount={} path={} ver={}", mount, path, secret_ref.version);

    match &secret_ref.version {
        KvVersion::V1 => reader.read_kv_v1(mount, path).await,
        KvVersion::V2 => reader.read_kv_v2(mount, path).await,
        KvVersion::Unknown(version) => Err(Error::UnknownKvVersion {
            secret: secret_ref.to_string(),
            version: version.clone(),
        }),
    }
}

/// Resolve a reference to its final, formatted string value
///
/// # Errors
///
/// * `Error::MissingSubpath` if the path has no segment below the mount
/// * `Error::UnknownKvVersion` for versions other than `v1`/`v2`
/// * `Error::NilSecret` if the store has no secret at the path
/// * `Error::FieldNotString` if the field is absent or not a string
/// * transformation errors from auto-decoding or the `transform` chain
/// * any error returned by the reader itself
pub async fn resolve<R>(secret_ref: &SecretRef, reader: &R) -> Result<String>
where
    R: KvReader + ?Sized,
{
    let data = read_kv(secret_ref, reader).await?.ok_or(Error::NilSecret)?;
    secret_ref.format_secret(&data)
}

/// Parse `raw` as a reference and resolve it
pub async fn resolve_str<R>(raw: &str, reader: &R) -> Result<String>
where
    R: KvReader + ?Sized,
{
    let secret_ref: SecretRef = raw.parse()?;
    resolve(&secret_ref, reader).await
}
