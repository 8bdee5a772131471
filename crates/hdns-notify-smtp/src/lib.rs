// # SMTP Mailer
//
// Relays operator notifications through an authenticated SMTP server.
//
// - ✅ Login with the configured user and password
// - ✅ STARTTLS when the server offers it, implicit TLS on port 465
// - ✅ Plain-text body, one recipient
// - ❌ NO queueing or retry (the notifier treats delivery as best-effort)

use std::time::Duration;

use async_trait::async_trait;
use hdns_core::traits::Mailer;
use hdns_core::{Error, Result, SmtpConfig};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Port on which the server expects TLS from the first byte
const IMPLICIT_TLS_PORT: u16 = 465;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP-backed [`Mailer`]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    server: String,
    port: u16,
}

// Custom Debug implementation: the transport holds the credentials
impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .finish()
    }
}

impl SmtpMailer {
    /// Create a mailer from the SMTP settings
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: invalid settings or addresses
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        config.validate()?;

        let from = parse_mailbox("sender", config.sender())?;
        let to = parse_mailbox("recipient", &config.recipient)?;

        let tls_parameters = TlsParameters::new(config.server.clone())
            .map_err(|e| Error::config(format!("smtp TLS setup failed: {}", e)))?;
        let tls = if config.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.server.as_str())
            .port(config.port)
            .tls(tls)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            server: config.server.clone(),
            port: config.port,
        })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::notification(format!("cannot build message: {}", e)))
    }
}

fn parse_mailbox(field: &str, address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::config(format!("smtp {} {:?} is not a valid address: {}", field, address, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::notification(format!("{}:{}: {}", self.server, self.port, e)))?;

        tracing::debug!("Notification mailed to {}", self.to);
        Ok(())
    }
}
