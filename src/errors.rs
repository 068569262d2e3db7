//! Error types and handling for vaultsubst
//!
//! Every failure while parsing, resolving or substituting a secret reference
//! is reported through a single [`Error`] enum. The variants carry structured
//! context (the offending field, mount or value) and render to stable,
//! human-readable messages.
//!
//! # Error Categories
//!
//! [`Error::kind`] maps every variant onto a closed [`ErrorKind`]:
//!
//! - **Syntax**: malformed `key=value` option or missing `path`/`field`
//! - **Lookup**: no sub-path below the mount, or the store has no secret there
//! - **TypeMismatch**: the requested field is absent or not a string
//! - **Transformation**: unknown transformation or malformed input to one
//! - **UnknownVersion**: unrecognized KV engine version
//! - **Transport**: HTTP, network, timeout or response decoding failures
//! - **Config**: invalid client or patcher configuration
//!
//! # Example
//!
//! ```
//! use vaultsubst::{ErrorKind, SecretRef};
//!
//! let err = "field=username".parse::<SecretRef>().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Syntax);
//! assert_eq!(err.to_string(), "path may not be empty");
//! ```

use thiserror::Error;

/// Result type alias for vaultsubst
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// An option inside a reference token is not a `key=value` pair
    #[error("unable to parse option: {raw} (value {option})")]
    MalformedOption {
        /// The complete token body being parsed
        raw: String,
        /// The offending comma-separated option
        option: String,
    },

    /// A recognized option carries a value of the wrong shape
    #[error("invalid value for option {key}: {value}")]
    InvalidOption {
        /// Option key
        key: String,
        /// Rejected value
        value: String,
    },

    /// Reference token without a `path`
    #[error("path may not be empty")]
    EmptyPath,

    /// Reference token without a `field`
    #[error("field may not be empty")]
    EmptyField,

    /// The path names a mount but nothing below it
    #[error("no path to query using mountpoint {mount}")]
    MissingSubpath {
        /// Mount name taken from the first path segment
        mount: String,
    },

    /// The store returned no secret for the requested path
    #[error("secret is nil")]
    NilSecret,

    /// The requested field is absent or not a string
    #[error("could not cast data at field {field} to string")]
    FieldNotString {
        /// Requested field name
        field: String,
    },

    /// Transformation name not known to the registry
    #[error("unknown transformation: {name}")]
    UnknownTransformation {
        /// Requested transformation name
        name: String,
    },

    /// Base64 decoding failed
    #[error("base64 decode: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Base64 decoded bytes are not valid UTF-8
    #[error("base64 decode: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// KV engine version other than `v1` or `v2`
    #[error("secret {secret}: unknown kv version {version}")]
    UnknownKvVersion {
        /// Canonical rendering of the reference being resolved
        secret: String,
        /// Rejected version tag
        version: String,
    },

    /// HTTP error from the Vault API
    #[error("http {status}: {message} (req={request_id:?})")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error messages reported by Vault, joined with `; `
        message: String,
        /// Request ID sent with the request
        request_id: Option<String>,
    },

    /// Deserialization error
    #[error("deserialize: {0}")]
    Deserialize(String),

    /// Network error
    #[error("network: {0}")]
    Network(String),

    /// Request timeout
    #[error("timeout")]
    Timeout,

    /// Configuration error
    #[error("config: {0}")]
    Config(String),
}

/// Closed classification of [`Error`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed reference token
    Syntax,
    /// Nothing to read at the referenced location
    Lookup,
    /// Field missing or not string-typed
    TypeMismatch,
    /// Transformation pipeline failure
    Transformation,
    /// Unrecognized KV engine version
    UnknownVersion,
    /// Failure talking to the store
    Transport,
    /// Invalid configuration
    Config,
}

impl Error {
    /// Get the error kind for categorization
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedOption { .. }
            | Error::InvalidOption { .. }
            | Error::EmptyPath
            | Error::EmptyField => ErrorKind::Syntax,
            Error::MissingSubpath { .. } | Error::NilSecret => ErrorKind::Lookup,
            Error::FieldNotString { .. } => ErrorKind::TypeMismatch,
            Error::UnknownTransformation { .. } | Error::Decode(_) | Error::InvalidUtf8(_) => {
                ErrorKind::Transformation
            }
            Error::UnknownKvVersion { .. } => ErrorKind::UnknownVersion,
            Error::Http { .. } | Error::Deserialize(_) | Error::Network(_) | Error::Timeout => {
                ErrorKind::Transport
            }
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Get the HTTP status code if this is an HTTP error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the request ID if available
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Http { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Byte offset of the first invalid symbol for base64 decode failures
    pub fn invalid_byte_offset(&self) -> Option<usize> {
        match self {
            Error::Decode(base64::DecodeError::InvalidByte(offset, _))
            | Error::Decode(base64::DecodeError::InvalidLastSymbol(offset, _)) => Some(*offset),
            _ => None,
        }
    }

    /// Create an HTTP error from a Vault error body
    pub(crate) fn from_response(
        status: u16,
        errors: &[String],
        request_id: Option<String>,
    ) -> Self {
        let message = if errors.is_empty() {
            format!("HTTP error {}", status)
        } else {
            errors.join("; ")
        };
        Error::Http {
            status,
            message,
            request_id,
        }
    }
}

/// Vault error response structure
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() || err.is_request() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialize(err.to_string())
    }
}
