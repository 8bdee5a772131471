// # IP Source Trait
//
// Defines the interface for learning this host's public address per family.
//
// ## Implementations
//
// - HTTP echo services (ipify): `hdns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use hdns_core::{IpFamily, IpSource};
//
// let source = /* IpSource implementation */;
// let v4 = source.public_ip(IpFamily::V4).await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::model::IpFamily;

/// Trait for public IP sources
///
/// A source answers one question: which address does the outside world
/// see for this host, for the given family. It makes one lookup per call
/// and never retries; the fatal/degraded policy lives in
/// [`crate::discovery::discover_public_ips`].
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Look up the public address of one family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The address, guaranteed to belong to `family`
    /// - `Err(Error)`: The service failed or returned something unusable
    async fn public_ip(&self, family: IpFamily) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
