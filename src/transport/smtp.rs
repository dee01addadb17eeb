//! SMTP transport backed by lettre's async client.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::{SmtpConfig, SmtpTls};

use super::message::build_message;
use super::{MailTransport, OutgoingEmail, TransportError};

pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
    sender: Option<String>,
    authenticated: bool,
}

impl SmtpMailTransport {
    /// Build the transport from configuration.
    ///
    /// Missing credentials are not an error here; every send fails instead,
    /// so the service can still start and serve drafts and queries.
    pub fn from_config(config: &SmtpConfig, timeout: Duration) -> Result<Self, TransportError> {
        let host = config.host.as_str();

        let builder = match config.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Required(TlsParameters::new(host.to_string())?)),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Wrapper(TlsParameters::new(host.to_string())?)),
        }
        .port(config.port)
        .timeout(Some(timeout));

        let authenticated = config.has_credentials();
        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) if authenticated => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => {
                tracing::warn!(smtp_host = %host, "SMTP credentials not configured, sends will fail");
                builder
            }
        };

        tracing::info!(
            smtp_host = %host,
            smtp_port = config.port,
            tls = ?config.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            inner: builder.build(),
            sender: config.sender().map(str::to_string),
            authenticated,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        if !self.authenticated {
            return Err(TransportError::MissingCredentials);
        }
        let from = self.sender.as_deref().ok_or(TransportError::MissingSender)?;

        let message = build_message(from, email)?;
        let response = self.inner.send(message).await?;

        tracing::debug!(
            code = %response.code(),
            "SMTP server accepted message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "ana@example.com".to_string(),
            subject: "Hi".to_string(),
            text: Some("hi".to_string()),
            html: None,
        }
    }

    #[tokio::test]
    async fn test_send_without_credentials_fails_before_connecting() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            tls: SmtpTls::None,
            ..SmtpConfig::default()
        };
        let transport = SmtpMailTransport::from_config(&config, Duration::from_secs(1)).unwrap();

        let err = transport.send(&email()).await.unwrap_err();
        assert!(matches!(err, TransportError::MissingCredentials));
        assert_eq!(err.to_string(), "SMTP credentials not configured");
    }

    #[tokio::test]
    async fn test_send_without_sender_fails() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            tls: SmtpTls::None,
            username: Some("  ".to_string()),
            password: Some("secret".to_string()),
            ..SmtpConfig::default()
        };
        let transport = SmtpMailTransport::from_config(&config, Duration::from_secs(1)).unwrap();

        assert!(matches!(
            transport.send(&email()).await,
            Err(TransportError::MissingSender)
        ));
    }
}
