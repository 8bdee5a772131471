//! Domain model shared by the provider client, resolver and engine
//!
//! Zones and records are snapshots fetched fresh for every domain and
//! dropped once that domain's reconciliation finishes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A provider-managed DNS zone (e.g. `example.com`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque provider identifier
    pub id: String,
    /// Zone name, a domain suffix
    pub name: String,
}

/// DNS record type
///
/// Only A and AAAA are reconciled; anything else is carried through as
/// `Other` so listings with MX, TXT, ... still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Any other record type, verbatim
    Other(String),
}

impl RecordType {
    /// Wire representation of the type
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            _ => Self::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS resource record as currently stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque provider identifier
    pub id: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Label relative to the zone (not an FQDN), `@` for the apex
    pub name: String,
    /// Record value, an IP address in text form for A/AAAA
    pub value: String,
    /// Record TTL, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl Record {
    /// Whether the stored value denotes the given address
    ///
    /// Values are compared as parsed addresses so `2001:db8::1` and
    /// `2001:0db8:0:0:0:0:0:1` are equal. A value that does not parse
    /// never matches.
    pub fn points_to(&self, ip: IpAddr) -> bool {
        self.value
            .trim()
            .parse::<IpAddr>()
            .is_ok_and(|stored| stored == ip)
    }
}

/// Address family reconciled by one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// The record type carrying addresses of this family
    pub fn record_type(self) -> RecordType {
        match self {
            Self::V4 => RecordType::A,
            Self::V6 => RecordType::Aaaa,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

/// Public addresses discovered for this host
///
/// `None` means no address of that family is currently reachable, which
/// the engine treats as "the record should not exist".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredIps {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl DiscoveredIps {
    /// Discovered address for one family
    pub fn get(&self, family: IpFamily) -> Option<IpAddr> {
        match family {
            IpFamily::V4 => self.v4.map(IpAddr::V4),
            IpFamily::V6 => self.v6.map(IpAddr::V6),
        }
    }
}

impl fmt::Display for DiscoveredIps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v4 = self.v4.map(|ip| ip.to_string()).unwrap_or_default();
        let v6 = self.v6.map(|ip| ip.to_string()).unwrap_or_default();
        write!(f, "'{v4}' / '{v6}'")
    }
}

/// Contents of a record write (create or update)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordData {
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    pub ttl: u32,
}
