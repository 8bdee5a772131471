//! Domain resolver
//!
//! Maps a configured FQDN to the zone that owns it and the record label
//! inside that zone. Candidate zones are the FQDN's suffixes, tried from the
//! longest (most specific) to the shortest, so nested zones such as
//! `sub.example.com` win over `example.com` and multi-level labels such as
//! `a.b` under `example.com` resolve correctly.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Zone;

/// A configured domain split into its owning zone and record label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
    /// Provider identifier of the owning zone
    pub zone_id: String,
    /// Name of the owning zone
    pub zone_name: String,
    /// Everything before the zone suffix (e.g. `host` or `a.b`)
    pub label: String,
}

/// Resolve the owning zone of `fqdn`
///
/// Matching ignores ASCII case and a trailing dot on either side. The
/// first zone in `zones` with a matching name wins for a given suffix.
///
/// # Returns
///
/// - `Ok(ResolvedDomain)`: The most specific matching zone
/// - `Err(Error::Resolution)`: Malformed name, or no suffix matches any zone
pub fn resolve_zone(fqdn: &str, zones: &[Zone]) -> Result<ResolvedDomain> {
    let domain = normalize(fqdn);
    if domain.is_empty() || domain.split('.').any(str::is_empty) {
        return Err(Error::resolution(format!("invalid domain name: '{fqdn}'")));
    }

    // Each dot splits the name into (label, suffix); earlier dots give longer suffixes.
    for (pos, _) in domain.match_indices('.') {
        let (label, suffix) = (&domain[..pos], &domain[pos + 1..]);

        if let Some(zone) = zones
            .iter()
            .find(|zone| normalize(&zone.name).eq_ignore_ascii_case(suffix))
        {
            debug!("Resolved {} to zone {} (label '{}')", fqdn, zone.name, label);
            return Ok(ResolvedDomain {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                label: label.to_string(),
            });
        }
    }

    Err(Error::resolution(format!(
        "can't find a zone for domain '{fqdn}'"
    )))
}

fn normalize(name: &str) -> &str {
    let name = name.trim();
    name.strip_suffix('.').unwrap_or(name)
}
