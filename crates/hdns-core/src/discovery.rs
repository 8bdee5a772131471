//! Public IP discovery policy
//!
//! IPv4 is the baseline: if it cannot be determined the run is aborted.
//! IPv6 is optional: any failure degrades to "no IPv6 address", which the
//! engine turns into delete-or-noop for AAAA records.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{DiscoveredIps, IpFamily};
use crate::traits::IpSource;

/// Discover both public addresses, once per run
///
/// # Returns
///
/// - `Ok(DiscoveredIps)`: `v4` always set, `v6` set only if the lookup succeeded
/// - `Err(Error::Discovery)`: IPv4 lookup failed
pub async fn discover_public_ips(source: &dyn IpSource) -> Result<DiscoveredIps> {
    let v4 = match source.public_ip(IpFamily::V4).await {
        Ok(IpAddr::V4(ip)) => ip,
        Ok(other) => {
            return Err(Error::discovery(format!(
                "{} returned {other} for an IPv4 lookup",
                source.source_name()
            )));
        }
        Err(e) => {
            return Err(Error::discovery(format!(
                "cannot determine public IPv4 address via {}: {e}",
                source.source_name()
            )));
        }
    };
    debug!("Public IPv4 address: {}", v4);

    let v6 = match source.public_ip(IpFamily::V6).await {
        Ok(IpAddr::V6(ip)) => Some(ip),
        Ok(other) => {
            warn!("{} returned {} for an IPv6 lookup, assuming no IPv6", source.source_name(), other);
            None
        }
        Err(e) => {
            warn!("IPv6 lookup failed, assuming no IPv6 address: {}", e);
            None
        }
    };

    let discovered = DiscoveredIps { v4: Some(v4), v6 };
    info!("Current public IP: {}", discovered);
    Ok(discovered)
}
