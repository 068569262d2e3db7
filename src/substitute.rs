//! Replacing reference tokens in text buffers
//!
//! A token is a secret reference wrapped in a delimiter on both sides, e.g.
//! `@@path=kv/app,field=user@@`. Every token is parsed, resolved and replaced
//! by its value; any failure aborts the whole buffer.
//!
//! # Example
//!
//! ```no_run
//! use vaultsubst::{ClientBuilder, Patcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::from_env()?.build()?;
//! let patcher = Patcher::new("@@")?;
//!
//! let rendered = patcher
//!     .patch("DATABASE_USER=@@path=kv/db,field=username@@\n", &client)
//!     .await?;
//! print!("{}", rendered);
//! # Ok(())
//! # }
//! ```

use crate::{
    errors::{Error, Result},
    kv::KvReader,
    secret_ref::SecretRef,
};
use regex::Regex;
use tracing::trace;

/// Compiled token matcher for one delimiter
#[derive(Debug, Clone)]
pub struct Patcher {
    delimiter: String,
    pattern: Regex,
}

impl Patcher {
    /// Create a patcher matching tokens wrapped in `delimiter`
    ///
    /// The delimiter is matched literally; characters with a special meaning
    /// in regular expressions need no escaping.
    ///
    /// # Errors
    ///
    /// * `Error::Config` if the delimiter is empty
    pub fn new(delimiter: impl Into<String>) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(Error::Config("delimiter may not be empty".to_string()));
        }

        let escaped = regex::escape(&delimiter);
        let pattern = Regex::new(&format!("{}(.*?){}", escaped, escaped))
            .map_err(|e| Error::Config(format!("invalid delimiter pattern: {}", e)))?;

        Ok(Self { delimiter, pattern })
    }

    /// The delimiter this patcher matches
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Return the full text and body of every token in `input`, left to right
    pub fn tokens<'a>(&self, input: &'a str) -> Vec<(&'a str, &'a str)> {
        self.pattern
            .captures_iter(input)
            .filter_map(|caps| Some((caps.get(0)?.as_str(), caps.get(1)?.as_str())))
            .collect()
    }

    /// Resolve every token in `input` and return the patched text
    ///
    /// Each occurrence of a matched token's text is replaced by the resolved
    /// value. Tokens are resolved one at a time in order of appearance, and
    /// the first error is returned without any partial output.
    pub async fn patch<R>(&self, input: &str, reader: &R) -> Result<String>
    where
        R: KvReader + ?Sized,
    {
        let tokens = self.tokens(input);
        let mut output = input.to_string();

        for (token, body) in tokens {
            trace!("Resolving token {}", token);
            let secret_ref: SecretRef = body.parse()?;
            let value = secret_ref.fetch(reader).await?;
            output = output.replace(token, &value);
        }

        Ok(output)
    }
}

/// Resolve every `delimiter`-wrapped token in `input`
///
/// Convenience wrapper around [`Patcher`] for one-off buffers.
pub async fn patch<R>(input: &str, delimiter: &str, reader: &R) -> Result<String>
where
    R: KvReader + ?Sized,
{
    Patcher::new(delimiter)?.patch(input, reader).await
}
