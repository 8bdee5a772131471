//! Operator notifications
//!
//! Every message goes to the log sink first, then is relayed by email when
//! a [`Mailer`] is configured. Email failures are logged and swallowed so a
//! broken mail server can never stop reconciliation.

use tracing::{error, info, warn};

use crate::traits::Mailer;

/// Subject line of every notification email
pub const NOTIFICATION_SUBJECT: &str = "DNS Update Status";

/// Best-effort notifier
pub struct Notifier {
    mailer: Option<Box<dyn Mailer>>,
}

impl Notifier {
    /// Create a notifier relaying through `mailer`
    pub fn new(mailer: Box<dyn Mailer>) -> Self {
        Self {
            mailer: Some(mailer),
        }
    }

    /// Create a notifier that only logs
    pub fn log_only() -> Self {
        Self { mailer: None }
    }

    /// Report a state change
    pub async fn notify(&self, message: &str) {
        info!("{}", message);
        self.relay(message).await;
    }

    /// Report a failure
    pub async fn notify_failure(&self, message: &str) {
        error!("{}", message);
        self.relay(message).await;
    }

    async fn relay(&self, message: &str) {
        let Some(mailer) = &self.mailer else {
            return;
        };
        if let Err(e) = mailer.send(NOTIFICATION_SUBJECT, message).await {
            warn!("error sending email: {}", e);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("mailer", &self.mailer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FailingMailer {
        attempts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, subject: &str, body: &str) -> crate::Result<()> {
            self.attempts
                .lock()
                .unwrap()
                .push(format!("{subject}: {body}"));
            Err(crate::Error::notification("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_mail_failure_is_swallowed() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(Box::new(FailingMailer {
            attempts: Arc::clone(&attempts),
        }));

        notifier.notify("A record was updated: a.example.com").await;
        notifier.notify_failure("error updating A record").await;

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0], "DNS Update Status: A record was updated: a.example.com");
    }

    #[tokio::test]
    async fn test_log_only_notifier() {
        let notifier = Notifier::log_only();
        notifier.notify("nothing to relay").await;
        assert_eq!(format!("{notifier:?}"), "Notifier { mailer: false }");
    }
}
