// # DNS Provider Trait
//
// Defines the typed interface over a provider's zone/record REST endpoints.
//
// ## Implementations
//
// - Hetzner DNS: `hdns-provider-hetzner` crate
//
// ## Usage
//
// ```rust,ignore
// use hdns_core::DnsProvider;
//
// let provider = /* DnsProvider implementation */;
// let zones = provider.list_zones().await?;
// let records = provider.list_records(&zones[0].id).await?;
// ```

use async_trait::async_trait;

use crate::model::{Record, RecordData, Zone};

/// Trait for DNS provider implementations
///
/// Implementations are thin: every method is exactly one API call.
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (belongs to the scheduling layer)
/// - ❌ Cache zones or records between calls
/// - ❌ Decide whether a write is needed (owned by the reconciliation engine)
///
/// Writes succeed only on HTTP 200. Any other status, or a transport
/// failure, is returned as an [`crate::Error::Provider`] carrying the raw
/// status and response body.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all zones visible to the configured token, in response order
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List all records of a zone, in response order
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider identifier of the zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>, crate::Error>;

    /// Create a record in a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider identifier of the zone
    /// - `record`: Type, label, value and TTL of the new record
    async fn create_record(&self, zone_id: &str, record: &RecordData) -> Result<(), crate::Error>;

    /// Replace an existing record
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider identifier of the zone
    /// - `record_id`: Provider identifier of the record to replace
    /// - `record`: Type, label, value and TTL to store
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordData,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
