// # Hetzner DNS Provider
//
// This crate implements `hdns_core::DnsProvider` over the Hetzner DNS API v1.
//
// ## Implementation Status
//
// - ✅ One HTTP request per trait call (zone listing: one per page)
// - ✅ Full error propagation to the driver (status + raw response body)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error messages for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ Writes accepted only on HTTP 200
// - ✅ Configurable base URL (tests point it at a local mock server)
// - ❌ NO retry logic
// - ❌ NO caching of zones or records between calls
// - ❌ NO dry-run handling (the reconciliation engine never calls writes in dry-run)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - List Zones: GET `/zones?page=...&per_page=...` (paginated via `meta.pagination`)
// - List Records: GET `/records?zone_id=...`
// - Create Record: POST `/records`
// - Update Record: PUT `/records/:record_id`
// - Delete Record: DELETE `/records/:record_id`
//
// Authentication is the `Auth-API-Token` header on every request.

use async_trait::async_trait;
use hdns_core::traits::DnsProvider;
use hdns_core::{Error, ProviderSettings, Record, RecordData, RecordType, Result, Zone};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication header expected by the Hetzner DNS API
const AUTH_HEADER: &str = "Auth-API-Token";

/// Page size requested when listing zones (API maximum is 100)
const ZONES_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    #[serde(default)]
    zones: Vec<Zone>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    last_page: u32,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Record>,
}

/// Body of create and update requests
#[derive(Debug, Serialize)]
struct RecordRequest<'a> {
    zone_id: &'a str,
    #[serde(rename = "type")]
    record_type: &'a RecordType,
    name: &'a str,
    value: &'a str,
    ttl: u32,
}

impl<'a> RecordRequest<'a> {
    fn new(zone_id: &'a str, record: &'a RecordData) -> Self {
        Self {
            zone_id,
            record_type: &record.record_type,
            name: &record.name,
            value: &record.value,
            ttl: record.ttl,
        }
    }
}

/// Hetzner DNS provider
///
/// Stateless apart from the HTTP connection pool. Every trait method maps
/// to one API request, except `list_zones` which walks all pages.
pub struct HetznerProvider {
    /// Hetzner DNS API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HetznerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HetznerProvider {
    /// Create a new Hetzner provider
    ///
    /// # Parameters
    ///
    /// - `settings`: API token and base URL
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: empty token or base URL
    /// - `Err(Error::Other)`: the HTTP client could not be built
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        if settings.api_token.is_empty() {
            return Err(Error::config("Hetzner API token cannot be empty"));
        }
        if settings.base_url.is_empty() {
            return Err(Error::config("Hetzner API base URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token: settings.api_token.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTH_HEADER, &self.api_token)
    }

    /// Send a request, mapping transport failures
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::transport(operation, format!("HTTP request failed: {}", e)))
    }

    /// Decode a successful (2xx) read response
    async fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        response: Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(status_error(operation, response).await);
        }

        let status = response.status().as_u16();
        response.json().await.map_err(|e| {
            Error::provider(operation, status, format!("Failed to parse response: {}", e))
        })
    }

    /// Accept a write response only on HTTP 200
    async fn expect_ok(&self, operation: &str, response: Response) -> Result<()> {
        if response.status() != StatusCode::OK {
            return Err(status_error(operation, response).await);
        }
        Ok(())
    }
}

/// Map a non-accepted response to a provider error carrying the raw body
async fn status_error(operation: &str, response: Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: invalid API token or insufficient permissions. Status: {} - {}",
            status, body
        ),
        404 => format!("Not found. Status: {} - {}", status, body),
        429 => format!("Rate limit exceeded. Status: {} - {}", status, body),
        500..=599 => format!("Hetzner server error: {} - {}", status, body),
        _ => format!("Unexpected status: {} - {}", status, body),
    };

    tracing::debug!("{} failed with status {}", operation, status);
    Error::provider(operation, status.as_u16(), message)
}

#[async_trait]
impl DnsProvider for HetznerProvider {
    /// ```http
    /// GET /zones?page=<n>&per_page=100
    /// Auth-API-Token: <token>
    /// ```
    ///
    /// Pages are requested until `meta.pagination.last_page` is reached or
    /// a page comes back empty. A response without pagination metadata is
    /// treated as the only page.
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut zones = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = self
                .request(Method::GET, "/zones")
                .query(&[("page", page), ("per_page", ZONES_PER_PAGE)]);
            let response = self.send("list_zones", request).await?;
            let body: ZonesResponse = self.read_json("list_zones", response).await?;

            let last_page = body.meta.pagination.map_or(page, |p| p.last_page);
            let empty = body.zones.is_empty();
            zones.extend(body.zones);

            if empty || page >= last_page {
                break;
            }
            page += 1;
        }

        tracing::debug!("Fetched {} zone(s) in {} page(s)", zones.len(), page);
        Ok(zones)
    }

    /// ```http
    /// GET /records?zone_id=<zone_id>
    /// Auth-API-Token: <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        let request = self
            .request(Method::GET, "/records")
            .query(&[("zone_id", zone_id)]);
        let response = self.send("list_records", request).await?;
        let body: RecordsResponse = self.read_json("list_records", response).await?;

        tracing::debug!("Fetched {} record(s) of zone {}", body.records.len(), zone_id);
        Ok(body.records)
    }

    /// ```http
    /// POST /records
    /// {"zone_id": "...", "type": "A", "name": "www", "value": "1.2.3.4", "ttl": 300}
    /// ```
    async fn create_record(&self, zone_id: &str, record: &RecordData) -> Result<()> {
        let request = self
            .request(Method::POST, "/records")
            .json(&RecordRequest::new(zone_id, record));
        let response = self.send("create_record", request).await?;
        self.expect_ok("create_record", response).await
    }

    /// ```http
    /// PUT /records/:record_id
    /// {"zone_id": "...", "type": "A", "name": "www", "value": "1.2.3.4", "ttl": 300}
    /// ```
    async fn update_record(&self, zone_id: &str, record_id: &str, record: &RecordData) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("/records/{}", record_id))
            .json(&RecordRequest::new(zone_id, record));
        let response = self.send("update_record", request).await?;
        self.expect_ok("update_record", response).await
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/records/{}", record_id));
        let response = self.send("delete_record", request).await?;
        self.expect_ok("delete_record", response).await
    }

    fn provider_name(&self) -> &'static str {
        "hetzner"
    }
}
