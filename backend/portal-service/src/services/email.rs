/// Contact form relay over SMTP
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::models::ContactRequest;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to configure SMTP transport: {0}")]
    Transport(String),

    #[error("Failed to build email message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Send(String),
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Async email transport wrapper (SMTP or no-op)
///
/// Submissions are delivered to the configured mailbox with the submitter
/// as `Reply-To`. With an empty SMTP host the relay builds the message but
/// skips delivery.
#[derive(Clone)]
pub struct ContactRelay {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    mailbox: Mailbox,
    subject: String,
}

impl ContactRelay {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mailbox = parse_mailbox(&config.contact_mailbox)?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; contact relay will operate in no-op mode");
            None
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| MailError::Transport(e.to_string()))?
                .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            mailbox,
            subject: config.contact_subject.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Build the outgoing message for a submission
    pub fn compose(&self, request: &ContactRequest) -> Result<Message, MailError> {
        let reply_to = parse_mailbox(&request.email)?;
        let body = format!(
            "Name: {}, Email: {}, Message: {}",
            request.name, request.email, request.message
        );

        Message::builder()
            .from(self.mailbox.clone())
            .to(self.mailbox.clone())
            .reply_to(reply_to)
            .subject(self.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailError::Build(e.to_string()))
    }

    pub async fn send(&self, request: &ContactRequest) -> Result<(), MailError> {
        let message = self.compose(request)?;

        match &self.transport {
            Some(transport) => {
                transport
                    .send(message)
                    .await
                    .map_err(|e| MailError::Send(e.to_string()))?;
                info!(from = %request.email, "contact message sent");
            }
            None => {
                info!(
                    from = %request.email,
                    "Contact relay running in no-op mode; skipping actual send"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str) -> ContactRequest {
        ContactRequest {
            name: "Ada".into(),
            email: email.into(),
            message: "Hi there".into(),
        }
    }

    fn no_op() -> ContactRelay {
        ContactRelay::new(&SmtpConfig {
            contact_mailbox: "inbox@portal.test".into(),
            ..SmtpConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_host_is_no_op() {
        assert!(!no_op().is_enabled());
    }

    #[test]
    fn test_compose_body_and_headers() {
        let message = no_op().compose(&request("ada@x.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Name: Ada, Email: ada@x.com, Message: Hi there"));
        assert!(raw.contains("Reply-To: ada@x.com"));
        assert!(raw.contains("To: inbox@portal.test"));
        assert!(raw.contains("Subject: Hello"));
    }

    #[test]
    fn test_bad_submitter_address() {
        assert!(matches!(
            no_op().compose(&request("not an address")),
            Err(MailError::Address { .. })
        ));
    }

    #[test]
    fn test_bad_mailbox_config() {
        let result = ContactRelay::new(&SmtpConfig {
            contact_mailbox: "nope".into(),
            ..SmtpConfig::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_op_send_succeeds() {
        assert!(no_op().send(&request("ada@x.com")).await.is_ok());
    }
}
