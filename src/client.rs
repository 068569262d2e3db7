//! Vault HTTP client
//!
//! This module contains the `Client` struct, a thin [`KvReader`] over the
//! Vault HTTP API. It reads KV version 1 and version 2 secrets with a static
//! token and nothing more: no retries, no caching, no token renewal.
//!
//! # Examples
//!
//! ```no_run
//! use vaultsubst::ClientBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new("https://vault.example.com:8200")
//!     .token("hvs.example")
//!     .timeout_ms(10_000)
//!     .build()?;
//!
//! let user = client.resolve("path=kv/storage/postgres/creds,field=username").await?;
//! println!("user has {} characters", user.len());
//! # Ok(())
//! # }
//! ```

use crate::{
    config::ClientConfig,
    endpoints::Endpoints,
    errors::{Error, ErrorResponse, Result},
    kv::{self, KvReader},
    models::{KvV1Response, KvV2Response, SecretData},
    substitute::Patcher,
    util::{generate_request_id, header_str},
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, trace};

const USER_AGENT_PREFIX: &str = "vaultsubst";

/// Vault client
///
/// Reads secrets from KV v1 and v2 mounts and implements [`KvReader`], so it
/// can be handed to [`kv::resolve`] and [`Patcher::patch`].
#[derive(Clone)]
pub struct Client {
    pub(crate) config: ClientConfig,
    http: HttpClient,
    endpoints: Endpoints,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.config.address)
            .field("namespace", &self.config.namespace)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl Client {
    /// Create a new client with the given configuration
    pub(crate) fn new(config: ClientConfig) -> Result<Self> {
        // Build user agent
        let user_agent = if let Some(suffix) = &config.user_agent_suffix {
            format!("{}/{} {}", USER_AGENT_PREFIX, crate::VERSION, suffix)
        } else {
            format!("{}/{}", USER_AGENT_PREFIX, crate::VERSION)
        };

        let http = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoints: Endpoints::new(&config.address),
            http,
            config,
        })
    }

    /// Address of the Vault server
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Parse and resolve a single reference, e.g. `path=kv/app,field=user`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use vaultsubst::Client;
    /// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    /// let password = client
    ///     .resolve("path=kv/storage/postgres/creds,field=password,ver=v1,transform=trim")
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn resolve(&self, reference: &str) -> Result<String> {
        kv::resolve_str(reference, self).await
    }

    /// Replace every `delimiter`-wrapped reference in `input`
    pub async fn patch(&self, input: &str, delimiter: &str) -> Result<String> {
        Patcher::new(delimiter)?.patch(input, self).await
    }

    // Helper methods

    /// Build a request with common headers
    fn build_request(&self, method: Method, url: &str) -> (reqwest::RequestBuilder, String) {
        let request_id = generate_request_id();
        let mut builder = self
            .http
            .request(method, url)
            .header("X-Request-ID", &request_id)
            .header("X-Vault-Token", self.config.token.expose_secret().as_str());

        if let Some(namespace) = &self.config.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }

        (builder, request_id)
    }

    /// Send a GET request and return the response, or `None` on 404
    async fn get_secret_response(&self, url: &str) -> Result<Option<Response>> {
        let (request, request_id) = self.build_request(Method::GET, url);
        trace!("GET {} (req={})", url, request_id);

        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("No secret at {} (req={})", url, request_id);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.parse_error_response(response, request_id).await);
        }

        Ok(Some(response))
    }

    /// Parse error response from server
    async fn parse_error_response(&self, response: Response, request_id: String) -> Error {
        let status = response.status().as_u16();
        let request_id = header_str(response.headers(), "x-request-id").or(Some(request_id));

        // Try to parse JSON error response
        match response.json::<ErrorResponse>().await {
            Ok(error_resp) => Error::from_response(status, &error_resp.errors, request_id),
            Err(_) => Error::from_response(status, &[], request_id),
        }
    }
}

#[async_trait]
impl KvReader for Client {
    async fn read_kv_v1(&self, mount: &str, path: &str) -> Result<Option<SecretData>> {
        let url = self.endpoints.kv_v1(mount, path);
        let Some(response) = self.get_secret_response(&url).await? else {
            return Ok(None);
        };

        let body: KvV1Response = response.json().await.map_err(Error::from)?;
        Ok(body.data)
    }

    async fn read_kv_v2(&self, mount: &str, path: &str) -> Result<Option<SecretData>> {
        let url = self.endpoints.kv_v2(mount, path);
        let Some(response) = self.get_secret_response(&url).await? else {
            return Ok(None);
        };

        let body: KvV2Response = response.json().await.map_err(Error::from)?;
        if body.is_deleted() {
            debug!(
                "Version {:?} of {}/{} is deleted or destroyed",
                body.version(),
                mount,
                path
            );
        } else {
            trace!("Read version {:?} of {}/{}", body.version(), mount, path);
        }
        Ok(body.into_secret_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientBuilder, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(base_url: &str) -> Client {
        ClientBuilder::new(base_url)
            .token("test-token")
            .timeout_ms(5000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = create_test_client("https://vault.example.com/");
        assert_eq!(client.address(), "https://vault.example.com");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("test-token"));
    }

    #[tokio::test]
    async fn test_read_kv_v2() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/storage/postgres/creds"))
            .and(header("X-Vault-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": {"username": "cG9zdGdyZXM="},
                    "metadata": {"version": 1, "deletion_time": "", "destroyed": false}
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let data = client
            .read_kv_v2("kv", "storage/postgres/creds")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data["username"], json!("cG9zdGdyZXM="));
    }

    #[tokio::test]
    async fn test_read_kv_v1() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/secret/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"token": "abc"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let data = client.read_kv_v1("secret", "app").await.unwrap().unwrap();
        assert_eq!(data["token"], json!("abc"));
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        assert!(client.read_kv_v2("kv", "missing").await.unwrap().is_none());

        let err = client.resolve("path=kv/missing,field=x").await.unwrap_err();
        assert_eq!(err.to_string(), "secret is nil");
    }

    #[tokio::test]
    async fn test_deleted_version_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": null,
                    "metadata": {"version": 4, "deletion_time": "2024-01-01T00:00:00Z", "destroyed": false}
                }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        assert!(client.read_kv_v2("kv", "old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/forbidden"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.read_kv_v2("kv", "forbidden").await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("permission denied"));
        assert!(err.request_id().unwrap().starts_with("vaultsubst-"));
    }

    #[tokio::test]
    async fn test_namespace_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/app"))
            .and(header("X-Vault-Namespace", "team-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": {"name": "billing"}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ClientBuilder::new(mock_server.uri())
            .token("test-token")
            .namespace("team-a")
            .build()
            .unwrap();
        assert_eq!(client.resolve("path=kv/app,field=name").await.unwrap(), "billing");
    }

    #[tokio::test]
    async fn test_patch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/data/storage/postgres/creds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": {"username": "cG9zdGdyZXM="}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let output = client
            .patch(
                "user: %%path=kv/storage/postgres/creds,field=username,b64=true%%\n",
                "%%",
            )
            .await
            .unwrap();
        assert_eq!(output, "user: postgres\n");
    }
}
