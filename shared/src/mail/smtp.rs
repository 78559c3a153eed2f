use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::MailDispatcher;
use crate::error::{MailError, Result, ServiceError};

// Per-connection SMTP timeout
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an SMTP relay
#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from: String,
}

/// SMTP implementation of MailDispatcher backed by lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let from: Mailbox = settings.from.parse().map_err(|e| {
            ServiceError::ConfigError(format!(
                "Invalid sender address '{}': {}",
                settings.from, e
            ))
        })?;

        let mut builder = if settings.use_tls {
            let tls_params = TlsParameters::new(settings.host.clone()).map_err(|e| {
                ServiceError::InternalError(format!("SMTP TLS configuration error: {}", e))
            })?;

            // Port 465 uses implicit TLS, other ports upgrade with STARTTLS
            if settings.port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                    .map_err(|e| ServiceError::InternalError(format!("SMTP relay error: {}", e)))?
                    .port(settings.port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .map_err(|e| ServiceError::InternalError(format!("SMTP relay error: {}", e)))?
                    .port(settings.port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
        };

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let transport = builder.timeout(Some(SMTP_TIMEOUT)).build();

        log::info!(
            "SMTP mailer configured: host={}, port={}, tls={}",
            settings.host,
            settings.port,
            settings.use_tls
        );

        Ok(Self { transport, from })
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> std::result::Result<Message, MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::Rejected(format!("invalid recipient address '{}': {}", to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| MailError::Rejected(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl MailDispatcher for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> std::result::Result<(), MailError> {
        let message = self.build_message(to, subject, html_body)?;

        match self.transport.send(message).await {
            Ok(_) => {
                log::debug!("SMTP accepted message for {}", to);
                Ok(())
            }
            Err(err) => Err(classify_smtp_error(&err)),
        }
    }
}

// The server answered but refused this message: scoped to one recipient.
// Anything else (connect, TLS, timeout, 421 shutdown) means the relay is gone.
fn classify_smtp_error(err: &lettre::transport::smtp::Error) -> MailError {
    let service_closing = err
        .status()
        .map(|code| code.to_string() == "421")
        .unwrap_or(false);

    if !service_closing && (err.is_permanent() || err.is_transient() || err.is_response()) {
        MailError::Rejected(err.to_string())
    } else {
        MailError::Unavailable(err.to_string())
    }
}
