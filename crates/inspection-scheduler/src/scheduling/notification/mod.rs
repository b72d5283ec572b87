//! Best-effort booking confirmations and their audit trail.

pub mod coordinator;
pub mod message;
pub mod transport;

pub use coordinator::{NotificationCoordinator, CREDENTIALS_NOT_CONFIGURED};
pub use message::{compose_confirmation, CompositionError, OutboundEmail};
pub use transport::{DeliveryError, InMemoryOutbox, MailTransport, SmtpMailer};
