// # Mailer Trait
//
// Transport used by the notifier to relay operator messages by email.
//
// ## Implementations
//
// - SMTP: `hdns-notify-smtp` crate

use async_trait::async_trait;

/// Trait for email transports
///
/// Delivery is best-effort from the caller's point of view: the
/// [`crate::notify::Notifier`] logs failures and carries on.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message to the configured operator address
    async fn send(&self, subject: &str, body: &str) -> Result<(), crate::Error>;
}
