use crate::{errors::Result, util::is_loopback_url, Error};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the Vault address
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
/// Environment variable holding the Vault token
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
/// Environment variable holding the Vault Enterprise namespace
pub const VAULT_NAMESPACE_ENV: &str = "VAULT_NAMESPACE";
/// Environment variable holding the request timeout in seconds
pub const VAULT_CLIENT_TIMEOUT_ENV: &str = "VAULT_CLIENT_TIMEOUT";
/// Token file looked up in the home directory when no token variable is set
pub const TOKEN_FILE_NAME: &str = ".vault-token";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Vault server
    pub address: String,
    /// Vault token sent with every request
    pub token: SecretString,
    /// Vault Enterprise namespace
    pub namespace: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent suffix
    pub user_agent_suffix: Option<String>,
    /// Allow plain HTTP to non-loopback hosts
    pub allow_insecure_http: bool,
}

/// Builder for creating a configured Client
#[derive(Debug)]
pub struct ClientBuilder {
    address: String,
    token: Option<SecretString>,
    namespace: Option<String>,
    timeout_ms: u64,
    user_agent_suffix: Option<String>,
    allow_insecure_http: bool,
}

impl ClientBuilder {
    /// Create a new client builder for the Vault server at `address`
    ///
    /// # Arguments
    ///
    /// * `address` - Base URL of the Vault server (e.g., `"https://vault.example.com:8200"`)
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
            namespace: None,
            timeout_ms: crate::DEFAULT_TIMEOUT_MS,
            user_agent_suffix: None,
            allow_insecure_http: false,
        }
    }

    /// Create a builder configured the way the Vault CLI is
    ///
    /// Reads `VAULT_ADDR` (default [`crate::DEFAULT_ADDRESS`]), `VAULT_TOKEN`
    /// falling back to `~/.vault-token`, `VAULT_NAMESPACE` and
    /// `VAULT_CLIENT_TIMEOUT` (seconds).
    ///
    /// # Errors
    ///
    /// * `Error::Config` if no token can be found or the timeout is malformed
    pub fn from_env() -> Result<Self> {
        let address = non_empty_var(VAULT_ADDR_ENV)
            .unwrap_or_else(|| crate::DEFAULT_ADDRESS.to_string());
        let mut builder = Self::new(address).token(token_from_env()?);

        if let Some(namespace) = non_empty_var(VAULT_NAMESPACE_ENV) {
            builder = builder.namespace(namespace);
        }
        if let Some(timeout) = non_empty_var(VAULT_CLIENT_TIMEOUT_ENV) {
            builder = builder.timeout_ms(parse_timeout_secs(&timeout)? * 1000);
        }

        Ok(builder)
    }

    /// Set the Vault token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }

    /// Set the Vault Enterprise namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the request timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Add a custom user agent suffix
    pub fn user_agent_extra(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Allow plain `http://` addresses that are not loopback (dangerous!)
    pub fn allow_insecure_http(mut self) -> Self {
        self.allow_insecure_http = true;
        self
    }

    /// Build the configuration without creating a client
    pub fn build_config(self) -> Result<ClientConfig> {
        let address = self.address.trim().trim_end_matches('/');

        // Validate URL format
        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(Error::Config(
                "Vault address must start with http:// or https://".to_string(),
            ));
        }

        // Check for insecure HTTP
        if address.starts_with("http://") && !is_loopback_url(address) && !self.allow_insecure_http
        {
            return Err(Error::Config(format!(
                "refusing plain HTTP to {}. Use .allow_insecure_http() to enable (dangerous!)",
                address
            )));
        }

        // Require a token
        let token = self.token.ok_or_else(|| {
            Error::Config("A Vault token is required. Use .token() or set VAULT_TOKEN".to_string())
        })?;

        Ok(ClientConfig {
            address: address.to_string(),
            token,
            namespace: self.namespace,
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent_suffix: self.user_agent_suffix,
            allow_insecure_http: self.allow_insecure_http,
        })
    }

    /// Build the client with the configured options
    pub fn build(self) -> Result<crate::Client> {
        crate::client::Client::new(self.build_config()?)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve the token from `VAULT_TOKEN` or the token file in the home directory
fn token_from_env() -> Result<String> {
    if let Some(token) = non_empty_var(VAULT_TOKEN_ENV) {
        return Ok(token);
    }
    home_dir()
        .and_then(|home| read_token_file(&home))
        .map_err(|cause| {
            Error::Config(format!(
                "VAULT_TOKEN unset and/or failed to read token from ~/{}: {}",
                TOKEN_FILE_NAME, cause
            ))
        })
}

fn home_dir() -> std::result::Result<PathBuf, String> {
    dirs::home_dir().ok_or_else(|| "home directory could not be determined".to_string())
}

fn read_token_file(home: &Path) -> std::result::Result<String, String> {
    let path = home.join(TOKEN_FILE_NAME);
    let contents = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
    Ok(contents.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn parse_timeout_secs(value: &str) -> Result<u64> {
    value
        .trim()
        .trim_end_matches('s')
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("invalid {}: {}", VAULT_CLIENT_TIMEOUT_ENV, value)))
}
