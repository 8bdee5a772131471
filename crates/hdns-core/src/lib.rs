// # hdns-core
//
// Core library for keeping Hetzner DNS A/AAAA records pointed at the host's
// current public IP addresses.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for learning the host's public IPv4/IPv6 addresses
// - **DnsProvider**: Trait over the provider's zone/record REST endpoints
// - **Mailer**: Trait for relaying operator notifications by email
// - **resolve_zone**: Longest-suffix mapping of an FQDN to its owning zone
// - **Reconciler**: Per-family decision table plus the single write it implies
// - **Driver**: One discovery pass, then every configured domain in order
//
// ## Design Principles
//
// 1. **Run to completion**: One pass per invocation, no daemon, no persisted state
// 2. **Failure isolation**: A failing domain or record family never affects another
// 3. **Typed errors**: Callers branch on `ErrorKind`, not on message text
// 4. **Library-First**: The binary is a thin layer over this crate

pub mod traits;
pub mod engine;
pub mod resolver;
pub mod discovery;
pub mod driver;
pub mod notify;
pub mod model;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, Mailer};
pub use engine::{Action, OutcomeKind, Reconciler, ReconciliationOutcome, Status};
pub use resolver::{ResolvedDomain, resolve_zone};
pub use discovery::discover_public_ips;
pub use driver::{Driver, DriverConfig, DomainReport, RunEvent, RunReport};
pub use notify::Notifier;
pub use model::{DiscoveredIps, IpFamily, Record, RecordData, RecordType, Zone};
pub use config::{AppConfig, IpServicesConfig, ProviderSettings, SmtpConfig};
pub use error::{Error, ErrorKind, Result};
