//! Core traits for the DNS update system
//!
//! Every network boundary of the system sits behind one of these traits:
//!
//! - [`IpSource`]: Learn the host's public addresses
//! - [`DnsProvider`]: Read and write zones/records via the provider API
//! - [`Mailer`]: Relay operator notifications by email

pub mod ip_source;
pub mod dns_provider;
pub mod mailer;

pub use ip_source::IpSource;
pub use dns_provider::DnsProvider;
pub use mailer::Mailer;
