use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::config::{MailConfig, MailCredentials};
use crate::scheduling::domain::{
    Appointment, Customer, EmailLog, EmailLogEntry, EmailLogId, Inspector, Vehicle,
};
use crate::scheduling::repository::EmailLogRepository;

use super::message::{compose_confirmation, confirmation_subject};
use super::transport::MailTransport;

pub const CREDENTIALS_NOT_CONFIGURED: &str = "Credentials not configured";

/// Sends booking confirmations and records every attempt in the email log.
///
/// Delivery problems never surface as errors; they are written to the log.
pub struct NotificationCoordinator {
    credentials: Option<MailCredentials>,
    sender_name: String,
    transport: Arc<dyn MailTransport>,
    logs: Arc<dyn EmailLogRepository>,
}

impl std::fmt::Debug for NotificationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCoordinator")
            .field("credentials", &self.credentials)
            .field("sender_name", &self.sender_name)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl NotificationCoordinator {
    pub fn new(
        mail: &MailConfig,
        transport: Arc<dyn MailTransport>,
        logs: Arc<dyn EmailLogRepository>,
    ) -> Self {
        Self::with_credentials(mail.credentials(), &mail.sender_name, transport, logs)
    }

    pub fn with_credentials(
        credentials: Option<MailCredentials>,
        sender_name: &str,
        transport: Arc<dyn MailTransport>,
        logs: Arc<dyn EmailLogRepository>,
    ) -> Self {
        Self {
            credentials,
            sender_name: sender_name.to_string(),
            transport,
            logs,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn subject(&self) -> String {
        confirmation_subject(&self.sender_name)
    }

    pub fn logs(&self) -> &Arc<dyn EmailLogRepository> {
        &self.logs
    }

    /// Attempts one confirmation delivery and appends exactly one log entry.
    pub fn notify(
        &self,
        appointment: &Appointment,
        customer: &Customer,
        vehicle: &Vehicle,
        inspector: &Inspector,
        now: NaiveDateTime,
    ) -> EmailLog {
        let mut entry = EmailLogEntry {
            appointment_id: appointment.id,
            recipient: customer.email.trim().to_string(),
            subject: self.subject(),
            sent_at: now,
            was_sent: false,
            error_message: None,
        };

        match self.deliver(appointment, customer, vehicle, inspector) {
            Ok(()) => {
                entry.was_sent = true;
                info!(appointment = %appointment.id, recipient = %entry.recipient, "confirmation email sent");
            }
            Err(reason) => {
                warn!(appointment = %appointment.id, recipient = %entry.recipient, %reason, "confirmation email not sent");
                entry.error_message = Some(reason);
            }
        }

        self.record(entry)
    }

    /// Logs a failed attempt without trying delivery, for when the recipient cannot be resolved.
    pub fn record_failure(
        &self,
        appointment: &Appointment,
        reason: String,
        now: NaiveDateTime,
    ) -> EmailLog {
        warn!(appointment = %appointment.id, %reason, "confirmation email not sent");
        self.record(EmailLogEntry {
            appointment_id: appointment.id,
            recipient: String::new(),
            subject: self.subject(),
            sent_at: now,
            was_sent: false,
            error_message: Some(reason),
        })
    }

    fn deliver(
        &self,
        appointment: &Appointment,
        customer: &Customer,
        vehicle: &Vehicle,
        inspector: &Inspector,
    ) -> Result<(), String> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Err(CREDENTIALS_NOT_CONFIGURED.to_string());
        };

        let email = compose_confirmation(
            &self.sender_name,
            appointment,
            customer,
            vehicle,
            inspector,
        )
        .map_err(|err| err.to_string())?;

        self.transport
            .send(credentials, &email)
            .map_err(|err| err.to_string())
    }

    fn record(&self, entry: EmailLogEntry) -> EmailLog {
        match self.logs.append(entry.clone()) {
            Ok(log) => log,
            Err(err) => {
                error!(appointment = %entry.appointment_id, error = %err, "failed to persist email log");
                EmailLog::from_entry(EmailLogId::UNASSIGNED, entry)
            }
        }
    }
}
