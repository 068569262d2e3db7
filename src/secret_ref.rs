//! Secret references embedded in text
//!
//! A reference is the body of a delimiter-bounded token: a comma-separated
//! list of `key=value` options.
//!
//! | key         | meaning                                                |
//! |-------------|--------------------------------------------------------|
//! | `path`      | secret path, first segment is the KV mount (required)  |
//! | `field`     | key inside the secret data (required)                  |
//! | `b64`       | base64-decode the raw value before transformations     |
//! | `ver`       | KV engine version, `v1` or `v2` (default `v2`)         |
//! | `transform` | `|`-separated transformation names, applied in order   |
//!
//! Since options are separated by commas, transformation lists use pipes:
//! `transform=trim|upper`.
//!
//! # Example
//!
//! ```
//! use vaultsubst::{KvVersion, SecretRef};
//!
//! let secret_ref: SecretRef = "path=kv/storage/postgres/creds,field=username,b64=true,transform=trim|upper"
//!     .parse()
//!     .unwrap();
//! assert_eq!(secret_ref.path, "kv/storage/postgres/creds");
//! assert_eq!(secret_ref.field, "username");
//! assert!(secret_ref.b64);
//! assert_eq!(secret_ref.version, KvVersion::V2);
//! assert_eq!(secret_ref.transformations, vec!["trim", "upper"]);
//! ```

use crate::{
    errors::{Error, Result},
    kv::{self, KvReader},
    models::SecretData,
    transform,
};
use std::fmt;
use std::str::FromStr;

/// KV secrets engine version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KvVersion {
    /// KV version 1 (unversioned secrets)
    V1,
    /// KV version 2 (versioned secrets)
    #[default]
    V2,
    /// Any other tag; kept as written and rejected when the secret is read
    Unknown(String),
}

impl KvVersion {
    /// Tag used in reference tokens
    pub fn as_str(&self) -> &str {
        match self {
            KvVersion::V1 => "v1",
            KvVersion::V2 => "v2",
            KvVersion::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for KvVersion {
    fn from(tag: &str) -> Self {
        match tag {
            "v1" => KvVersion::V1,
            "v2" => KvVersion::V2,
            other => KvVersion::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed secret reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    /// Secret path including the mount, e.g. `kv/storage/postgres/creds`
    pub path: String,
    /// Field to extract from the secret data
    pub field: String,
    /// Whether the raw value is base64-decoded before transformations
    pub b64: bool,
    /// KV engine version used for the read
    pub version: KvVersion,
    /// Transformation names, applied left to right
    pub transformations: Vec<String>,
}

impl SecretRef {
    /// Create a reference to `field` at `path` with default options
    pub fn new(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field: field.into(),
            b64: false,
            version: KvVersion::default(),
            transformations: Vec::new(),
        }
    }

    /// Set the KV engine version
    pub fn with_version(mut self, version: KvVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable base64 auto-decoding
    pub fn with_b64(mut self, b64: bool) -> Self {
        self.b64 = b64;
        self
    }

    /// Append a transformation to the pipeline
    pub fn with_transformation(mut self, name: impl Into<String>) -> Self {
        self.transformations.push(name.into());
        self
    }

    /// Extract and format this reference's field from raw secret data
    ///
    /// The field value must be a string. It is base64-decoded first when
    /// `b64` is set, then passed through every transformation in order.
    pub fn format_secret(&self, data: &SecretData) -> Result<String> {
        let raw = data
            .get(&self.field)
            .and_then(|value| value.as_str())
            .ok_or_else(|| Error::FieldNotString {
                field: self.field.clone(),
            })?;

        let decoded = if self.b64 {
            transform::apply("base64d", raw)?
        } else {
            raw.to_string()
        };

        transform::apply_all(&self.transformations, &decoded)
    }

    /// Read this reference from the store and format the result
    ///
    /// Shorthand for [`kv::resolve`].
    pub async fn fetch<R>(&self, reader: &R) -> Result<String>
    where
        R: KvReader + ?Sized,
    {
        kv::resolve(self, reader).await
    }
}

impl FromStr for SecretRef {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let mut path = String::new();
        let mut field = String::new();
        let mut b64 = false;
        let mut version = None;
        let mut transformations = Vec::new();

        for option in raw.split(',') {
            let (key, value) = option
                .split_once('=')
                .ok_or_else(|| Error::MalformedOption {
                    raw: raw.to_string(),
                    option: option.to_string(),
                })?;
            let value = value.trim();

            match key.trim() {
                "path" => path = value.to_string(),
                "field" => field = value.to_string(),
                "b64" => b64 = parse_bool("b64", value)?,
                "ver" => version = Some(KvVersion::from(value)),
                "transform" => transformations = parse_list(value),
                // unknown options are ignored
                _ => {}
            }
        }

        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        if field.is_empty() {
            return Err(Error::EmptyField);
        }

        Ok(SecretRef {
            path,
            field,
            b64,
            version: version.unwrap_or_default(),
            transformations,
        })
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "path={},field={},b64={},ver={}",
            self.path, self.field, self.b64, self.version
        )?;
        if !self.transformations.is_empty() {
            write!(f, ",transform={}", self.transformations.join("|"))?;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        _ => Err(Error::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split('|').map(|s| s.trim().to_string()).collect()
}
