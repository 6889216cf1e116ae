// # Gandi LiveDNS Provider
//
// This crate provides the Gandi LiveDNS client used by the DNS-01 solver,
// and registers a `gandi` solver with a `SolverRegistry`.
//
// ## Behavior
//
// - One HTTP request per client method call
// - Full error propagation to the caller (no retry, no backoff)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - 404 on lookup is reported as "absent", never as an error
// - Dry-run mode sends `Dry-Run: 1` so Gandi validates without applying
// - Debug mode traces every request and response
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Client construction fails fast if the key is empty
//
// ## API Reference
//
// - LiveDNS API v5: https://api.gandi.net/docs/livedns/
// - Get record:    GET    `/domains/:fqdn/records/:rrset_name/:rrset_type`
// - Create record: POST   `/domains/:fqdn/records/:rrset_name/:rrset_type`
// - Update record: PUT    `/domains/:fqdn/records/:rrset_name/:rrset_type`
// - Delete record: DELETE `/domains/:fqdn/records/:rrset_name/:rrset_type`

use async_trait::async_trait;
use dns01_core::traits::{DnsClient, DnsClientFactory, DnsRecord};
use dns01_core::{ChallengeResolver, Error, Result, SolverRegistry};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Gandi LiveDNS API base URL
pub const GANDI_API_BASE: &str = "https://api.gandi.net/v5/livedns";

/// Name the Gandi solver is registered under
pub const SOLVER_NAME: &str = "gandi";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "gandi";

/// Record set as returned by `GET .../records/:name/:type`
#[derive(Debug, Deserialize)]
struct RrsetResponse {
    rrset_name: String,
    rrset_type: String,
    #[serde(default)]
    rrset_ttl: u32,
    #[serde(default)]
    rrset_values: Vec<String>,
}

/// Body of create and update calls
#[derive(Debug, Serialize)]
struct RrsetBody<'a> {
    rrset_ttl: u32,
    rrset_values: &'a [String],
}

/// Error body returned by LiveDNS on failures
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

impl ApiErrorBody {
    /// Best human-readable summary of the error body
    fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.cause.is_empty() {
            parts.push(self.cause.clone());
        }
        if !self.message.is_empty() {
            parts.push(self.message.clone());
        }
        for detail in &self.errors {
            parts.push(format!("{}: {}", detail.name, detail.description));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(": "))
        }
    }
}

/// Gandi LiveDNS client scoped to one API key
///
/// # Trust Level: Untrusted
///
/// The client is isolated, stateless and single-shot. Retries and
/// reconciliation decisions belong to the resolver and its caller.
pub struct GandiClient {
    /// Gandi API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL (overridable for tests and proxies)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Trace every request and response at debug level
    debug: bool,

    /// Ask Gandi to validate writes without applying them
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("debug", &self.debug)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiClient {
    /// Create a new Gandi client
    ///
    /// # Parameters
    ///
    /// - `api_key`: Gandi API key with LiveDNS permissions
    /// - `debug`: Trace requests and responses
    /// - `dry_run`: Send writes with `Dry-Run: 1`
    pub fn new(api_key: impl Into<String>, debug: bool, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: GANDI_API_BASE.to_string(),
            client,
            debug,
            dry_run,
        })
    }

    /// Create a client in live mode (no debug tracing, no dry-run)
    pub fn new_live(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, false, false)
    }

    /// Point the client at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build `{base}/domains/{root}/records/{name}/{type}`, percent-encoding each segment
    fn record_url(&self, root: &str, name: &str, record_type: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid Gandi API URL {}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::config(format!("Gandi API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["domains", root, "records", name, record_type]);

        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        if self.debug {
            tracing::debug!("Gandi request: {} {}", method, url);
        }

        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Apikey {}", self.api_key))
            .header("Accept", "application/json");

        if self.dry_run {
            request = request.header("Dry-Run", "1");
        }

        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        if self.debug {
            tracing::debug!("Gandi response: {}", response.status());
        }

        Ok(response)
    }

    /// Issue a create (POST) or update (PUT) for a record
    async fn write_record(
        &self,
        method: Method,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        let url = self.record_url(root, name, record_type)?;
        let body = RrsetBody {
            rrset_ttl: ttl,
            rrset_values: values,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] {} {} {} (ttl {}) validated only",
                method,
                name,
                record_type,
                ttl
            );
        }

        let response = self.send(self.request(method, url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(status_error(response, name, record_type).await);
        }

        Ok(())
    }
}

/// Map a non-success response to an error
async fn status_error(response: reqwest::Response, name: &str, record_type: &str) -> Error {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let detail = serde_json::from_str::<ApiErrorBody>(&error_text)
        .ok()
        .and_then(|body| body.summary())
        .unwrap_or(error_text);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API key or insufficient permissions. Status: {} - {}",
                status, detail
            ),
        ),
        StatusCode::NOT_FOUND => Error::provider(
            PROVIDER,
            format!("DNS record or domain not found: {} (type: {}) - {}", name, record_type, detail),
        ),
        StatusCode::CONFLICT => Error::provider(
            PROVIDER,
            format!("Conflict: record {} (type: {}) already exists. Status: {}", name, record_type, status),
        ),
        StatusCode::TOO_MANY_REQUESTS => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        s if s.is_server_error() => Error::provider(
            PROVIDER,
            format!("Gandi server error (transient): {} - {}", status, detail),
        ),
        _ => Error::provider(PROVIDER, format!("{} - {}", status, detail)),
    }
}

#[async_trait]
impl DnsClient for GandiClient {
    async fn get_record(&self, root: &str, name: &str, record_type: &str) -> Result<Option<DnsRecord>> {
        tracing::debug!("Looking up record {} (type: {}) in {}", name, record_type, root);

        let url = self.record_url(root, name, record_type)?;
        let response = self.send(self.request(Method::GET, url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("No record {} (type: {}) in {}", name, record_type, root);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response, name, record_type).await);
        }

        let rrset: RrsetResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(Some(DnsRecord {
            name: rrset.rrset_name,
            record_type: rrset.rrset_type,
            ttl: rrset.rrset_ttl,
            values: rrset.rrset_values,
        }))
    }

    async fn create_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.write_record(Method::POST, root, name, record_type, ttl, values)
            .await
    }

    async fn update_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.write_record(Method::PUT, root, name, record_type, ttl, values)
            .await
    }

    async fn delete_record(&self, root: &str, name: &str, record_type: &str) -> Result<()> {
        let url = self.record_url(root, name, record_type)?;
        let response = self.send(self.request(Method::DELETE, url)).await?;

        if !response.status().is_success() {
            return Err(status_error(response, name, record_type).await);
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Gandi clients per API key
#[derive(Debug, Clone, Default)]
pub struct GandiClientFactory {
    /// Base URL override; `None` uses [`GANDI_API_BASE`]
    base_url: Option<String>,
}

impl GandiClientFactory {
    /// Factory targeting the public Gandi API
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory targeting another base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }
}

impl DnsClientFactory for GandiClientFactory {
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsClient>> {
        let client = GandiClient::new_live(api_key)?;
        let client = match &self.base_url {
            Some(base_url) => client.with_base_url(base_url.clone()),
            None => client,
        };

        Ok(Box::new(client))
    }
}

/// Build the `gandi` solver around `factory`
pub fn solver(factory: GandiClientFactory) -> ChallengeResolver {
    ChallengeResolver::new(SOLVER_NAME, Arc::new(factory))
}

/// Register the Gandi solver with a registry
///
/// This function should be called during initialization to make the
/// `gandi` solver available.
///
/// # Example
///
/// ```rust
/// use dns01_core::SolverRegistry;
///
/// let registry = SolverRegistry::new();
/// dns01_provider_gandi::register(&registry, dns01_provider_gandi::GandiClientFactory::new());
/// assert!(registry.has_solver("gandi"));
/// ```
pub fn register(registry: &SolverRegistry, factory: GandiClientFactory) {
    registry.register_solver(Arc::new(solver(factory)));
}
