//! Named string transformations applied to resolved secret values
//!
//! Transformations are referenced by name from a token's `transform` option
//! and chained left to right, e.g. `transform=trim|upper`.
//!
//! | name      | effect                                  |
//! |-----------|-----------------------------------------|
//! | `upper`   | uppercase                               |
//! | `lower`   | lowercase                               |
//! | `trim`    | strip leading and trailing whitespace   |
//! | `base64`  | encode as standard base64               |
//! | `base64d` | decode standard base64                  |

use crate::errors::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// A single transformation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// `upper`
    Upper,
    /// `lower`
    Lower,
    /// `trim`
    Trim,
    /// `base64`
    Base64,
    /// `base64d`
    Base64Decode,
}

impl Transformation {
    /// All transformations known to the registry
    pub const ALL: [Transformation; 5] = [
        Transformation::Upper,
        Transformation::Lower,
        Transformation::Trim,
        Transformation::Base64,
        Transformation::Base64Decode,
    ];

    /// Look up a transformation by name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "upper" => Ok(Transformation::Upper),
            "lower" => Ok(Transformation::Lower),
            "trim" => Ok(Transformation::Trim),
            "base64" => Ok(Transformation::Base64),
            "base64d" => Ok(Transformation::Base64Decode),
            _ => Err(Error::UnknownTransformation {
                name: name.to_string(),
            }),
        }
    }

    /// Name used in reference tokens
    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Upper => "upper",
            Transformation::Lower => "lower",
            Transformation::Trim => "trim",
            Transformation::Base64 => "base64",
            Transformation::Base64Decode => "base64d",
        }
    }

    /// Apply this transformation to `input`
    pub fn apply(&self, input: &str) -> Result<String> {
        match self {
            Transformation::Upper => Ok(input.to_uppercase()),
            Transformation::Lower => Ok(input.to_lowercase()),
            Transformation::Trim => Ok(input.trim().to_string()),
            Transformation::Base64 => Ok(STANDARD.encode(input.as_bytes())),
            Transformation::Base64Decode => {
                let bytes = STANDARD.decode(input.as_bytes())?;
                Ok(String::from_utf8(bytes)?)
            }
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Transformation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Apply the transformation called `name` to `input`
///
/// # Errors
///
/// * `Error::UnknownTransformation` if `name` is not registered
/// * `Error::Decode` / `Error::InvalidUtf8` if `base64d` gets malformed input
///
/// # Example
///
/// ```
/// assert_eq!(vaultsubst::transform::apply("upper", "postgres").unwrap(), "POSTGRES");
/// assert!(vaultsubst::transform::apply("rot13", "postgres").is_err());
/// ```
pub fn apply(name: &str, input: &str) -> Result<String> {
    Transformation::from_name(name)?.apply(input)
}

/// Apply each named transformation in order, stopping at the first failure
pub fn apply_all<I, S>(names: I, input: &str) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .try_fold(input.to_string(), |value, name| apply(name.as_ref(), &value))
}
