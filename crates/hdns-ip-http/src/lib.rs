// # HTTP IP Source
//
// This crate learns the host's public addresses from plain-text echo
// services (ipify by default): one GET per family, the body is the address.
//
// ## Behavior
//
// - ✅ Separate service per family (IPv4 and IPv6 endpoints)
// - ✅ Response body trimmed before parsing
// - ✅ Answer must belong to the requested family
// - ✅ HTTP timeout configured (10 seconds)
// - ❌ NO failover between services
// - ❌ NO caching (one discovery pass per run)

use hdns_core::traits::IpSource;
use hdns_core::{Error, IpFamily, IpServicesConfig, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for echo-service requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// Service answering with the IPv4 address
    v4_url: String,

    /// Service answering with the IPv6 address
    v6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `services`: Echo service URLs per family
    pub fn new(services: &IpServicesConfig) -> Result<Self> {
        services.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            v4_url: services.v4_url.clone(),
            v6_url: services.v6_url.clone(),
            client,
        })
    }

    fn url(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.v4_url,
            IpFamily::V6 => &self.v6_url,
        }
    }
}

/// Parse an echo-service body and check its family
fn parse_answer(body: &str, family: IpFamily) -> Result<IpAddr> {
    let text = body.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::discovery(format!("Invalid IP address: {:?}", text)))?;

    match (family, ip) {
        (IpFamily::V4, IpAddr::V4(_)) | (IpFamily::V6, IpAddr::V6(_)) => Ok(ip),
        _ => Err(Error::discovery(format!("Expected {}, got: {}", family, ip))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn public_ip(&self, family: IpFamily) -> Result<IpAddr> {
        let url = self.url(family);
        tracing::debug!("Querying {} service: {}", family, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::discovery(format!(
                "HTTP error from {}: {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::discovery(format!("Failed to read response: {}", e)))?;

        parse_answer(&body, family)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
