//! Appointment scheduling for the inspection center: admission rules, the
//! status lifecycle, and best-effort confirmation notices.

pub mod domain;
pub mod engine;
pub mod memory;
pub mod notification;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentRequest, AppointmentStatus,
    Customer, CustomerId, EmailLog, EmailLogEntry, EmailLogId, Inspector, InspectorCertification,
    InspectorId, Vehicle, VehicleCategory, VehicleId,
};
pub use engine::{ConflictKind, RecordKind, SchedulingEngine, SchedulingError};
pub use memory::{
    InMemoryAppointmentStore, InMemoryEmailLog, InMemoryFleet, NewCustomer, NewInspector,
    NewVehicle,
};
pub use notification::{
    DeliveryError, InMemoryOutbox, MailTransport, NotificationCoordinator, OutboundEmail,
    SmtpMailer,
};
pub use repository::{AppointmentRepository, EmailLogRepository, FleetDirectory, RepositoryError};
pub use roster::{RosterError, RosterImporter, RosterSummary};
pub use router::scheduling_router;
pub use service::{AppointmentService, BookingReceipt};
pub use status::{InvalidTransition, StatusChange};
