use std::fmt::Debug;
use std::sync::Mutex;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};

use crate::config::{MailConfig, MailCredentials};

use super::message::OutboundEmail;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail transport rejected message: {0}")]
    Rejected(String),
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
}

/// Delivery capability. One call is one attempt; implementations do not retry.
pub trait MailTransport: Debug + Send + Sync {
    fn send(&self, sender: &MailCredentials, email: &OutboundEmail) -> Result<(), DeliveryError>;
}

/// Transport that keeps delivered messages in memory.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    delivered: Mutex<Vec<OutboundEmail>>,
}

impl InMemoryOutbox {
    pub fn delivered(&self) -> Vec<OutboundEmail> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl MailTransport for InMemoryOutbox {
    fn send(&self, _sender: &MailCredentials, email: &OutboundEmail) -> Result<(), DeliveryError> {
        self.delivered
            .lock()
            .map_err(|_| DeliveryError::Unavailable("outbox lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// STARTTLS relay authenticated with the sender's credentials on every send.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: SMTP_TIMEOUT,
        }
    }

    pub fn from_config(mail: &MailConfig) -> Self {
        Self::new(mail.smtp_host.trim(), mail.smtp_port)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn message(sender: &MailCredentials, email: &OutboundEmail) -> Result<Message, DeliveryError> {
        let from = mailbox(&sender.sender_name, &sender.sender_email)?;
        let to = mailbox(&email.recipient_name, &email.recipient)?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|err| DeliveryError::Rejected(err.to_string()))
    }
}

fn mailbox(name: &str, address: &str) -> Result<Mailbox, DeliveryError> {
    let address: Address = address
        .trim()
        .parse()
        .map_err(|err| DeliveryError::Rejected(format!("invalid address '{address}': {err}")))?;
    let name = Some(name.trim().to_string()).filter(|name| !name.is_empty());
    Ok(Mailbox::new(name, address))
}

impl MailTransport for SmtpMailer {
    fn send(&self, sender: &MailCredentials, email: &OutboundEmail) -> Result<(), DeliveryError> {
        let message = Self::message(sender, email)?;
        let relay = SmtpTransport::starttls_relay(&self.host)
            .map_err(|err| DeliveryError::Unavailable(err.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(
                sender.sender_email.clone(),
                sender.sender_password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        relay.send(&message).map(|_| ()).map_err(|err| {
            if err.is_permanent() {
                DeliveryError::Rejected(err.to_string())
            } else {
                DeliveryError::Unavailable(err.to_string())
            }
        })
    }
}
