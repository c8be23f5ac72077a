//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use url::Url;

use crate::api::{
    AssetsApi, ExecutionsApi, LogsApi, NamespacesApi, TestSuitesApi, TriggersApi,
};
use crate::error::{Error, ErrorResponse, Result};

/// Server used when no URL is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Tenant used when none is configured.
pub const DEFAULT_TENANT: &str = "main";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials attached to every request.
#[derive(Clone)]
pub(crate) enum Credentials {
    None,
    Token(String),
    Basic { username: String, password: String },
}

/// Orchestration API client.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use vigil_client::VigilClient;
///
/// # async fn example() -> vigil_client::Result<()> {
/// let client = VigilClient::builder()
///     .base_url("http://localhost:8080")
///     .auth_token("secret")
///     .tenant("main")
///     .build()?;
///
/// let execution = client.executions().get("4Zg2Kq").await?;
/// println!("{} is {}", execution.id, execution.state.current);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VigilClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) base_url: Url,
    /// Tenant path segment.
    pub(crate) tenant: String,
    /// Request credentials.
    pub(crate) credentials: Credentials,
    /// Request timeout.
    pub(crate) timeout: Duration,
}

impl VigilClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings pointing to localhost.
    pub fn localhost() -> Result<Self> {
        Self::builder().base_url(DEFAULT_SERVER_URL).build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the tenant requests are scoped to.
    pub fn tenant(&self) -> &str {
        &self.inner.tenant
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the executions API.
    pub fn executions(&self) -> ExecutionsApi {
        ExecutionsApi::new(self.clone())
    }

    /// Access the triggers API.
    pub fn triggers(&self) -> TriggersApi {
        TriggersApi::new(self.clone())
    }

    /// Access the logs API.
    pub fn logs(&self) -> LogsApi {
        LogsApi::new(self.clone())
    }

    /// Access the namespaces API.
    pub fn namespaces(&self) -> NamespacesApi {
        NamespacesApi::new(self.clone())
    }

    /// Access the assets API.
    pub fn assets(&self) -> AssetsApi {
        AssetsApi::new(self.clone())
    }

    /// Access the test suites API.
    pub fn test_suites(&self) -> TestSuitesApi {
        TestSuitesApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a tenant-scoped URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("api/v1/{}/{}", self.inner.tenant, path))
            .map_err(Error::from)
    }

    /// Start a request with credentials and timeout applied.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .inner
            .http
            .request(method, url)
            .timeout(self.inner.timeout);

        match &self.inner.credentials {
            Credentials::None => builder,
            Credentials::Token(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    /// Make a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");
        let response = self.request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");
        let response = self.request(Method::GET, url).query(query).send().await?;
        self.handle_response(response).await
    }

    /// Make a POST request with a JSON body.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        let response = self.request(Method::POST, url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Make a POST request with a JSON body, discarding the response body.
    pub(crate) async fn post_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        let response = self.request(Method::POST, url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        Ok(())
    }

    /// Make a POST request with query parameters and no body.
    pub(crate) async fn post_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        let response = self.request(Method::POST, url).query(query).send().await?;
        self.handle_response(response).await
    }

    /// Make a DELETE request with query parameters, discarding the body.
    pub(crate) async fn delete<Q>(&self, path: &str, query: &Q) -> Result<()>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "DELETE");
        let response = self.request(Method::DELETE, url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        Ok(())
    }

    /// Make a DELETE request with query parameters, decoding the body.
    pub(crate) async fn delete_returning<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "DELETE");
        let response = self.request(Method::DELETE, url).query(query).send().await?;
        self.handle_response(response).await
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        let message = match response.json::<ErrorResponse>().await {
            Ok(ErrorResponse {
                message: Some(message),
            }) => message,
            _ => format!("HTTP {}", status),
        };

        Error::from_status(status, message)
    }
}

/// Builder for creating a [`VigilClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    auth_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    tenant: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            username: None,
            password: None,
            tenant: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Authenticate with a bearer API token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Authenticate with HTTP basic credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the tenant requests are scoped to.
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<VigilClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Strip trailing slashes, then add exactly one so `join` keeps the path
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("{}/", trimmed))?;

        let credentials = match (self.auth_token, self.username, self.password) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(Error::Config(
                    "cannot use both API token and HTTP basic authentication".to_string(),
                ));
            }
            (Some(token), None, None) => Credentials::Token(token),
            (None, Some(username), Some(password)) => Credentials::Basic { username, password },
            (None, Some(_), None) | (None, None, Some(_)) => {
                return Err(Error::Config(
                    "both username and password are required for HTTP basic authentication"
                        .to_string(),
                ));
            }
            (None, None, None) => Credentials::None,
        };

        let tenant = self
            .tenant
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TENANT.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("vigil-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(VigilClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                tenant,
                credentials,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
