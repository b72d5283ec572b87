use chrono::NaiveDateTime;

use super::domain::{
    Appointment, AppointmentDraft, AppointmentId, Customer, CustomerId, EmailLog, EmailLogEntry,
    Inspector, InspectorCertification, InspectorId, Vehicle, VehicleId,
};

/// Read access to customers, vehicles and inspectors owned by registration.
pub trait FleetDirectory: Send + Sync {
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;
    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError>;
    fn inspector(&self, id: InspectorId) -> Result<Option<Inspector>, RepositoryError>;
    fn vehicles_for_customer(&self, id: CustomerId) -> Result<Vec<Vehicle>, RepositoryError>;
    fn inspectors_certified_for(
        &self,
        certification: InspectorCertification,
    ) -> Result<Vec<Inspector>, RepositoryError>;
}

/// Appointment storage. Implementations own identity assignment.
pub trait AppointmentRepository: Send + Sync {
    fn insert(&self, draft: AppointmentDraft) -> Result<Appointment, RepositoryError>;
    /// Overwrites status and timestamp of an existing record.
    fn update(&self, appointment: &Appointment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError>;
    fn all(&self) -> Result<Vec<Appointment>, RepositoryError>;
    fn by_vehicle(&self, id: VehicleId) -> Result<Vec<Appointment>, RepositoryError>;
    fn by_inspector(&self, id: InspectorId) -> Result<Vec<Appointment>, RepositoryError>;
    fn has_conflict_for_inspector(
        &self,
        id: InspectorId,
        at: NaiveDateTime,
    ) -> Result<bool, RepositoryError>;
    fn has_conflict_for_vehicle(
        &self,
        id: VehicleId,
        at: NaiveDateTime,
    ) -> Result<bool, RepositoryError>;
}

/// Append-only store of confirmation attempts.
pub trait EmailLogRepository: Send + Sync {
    fn append(&self, entry: EmailLogEntry) -> Result<EmailLog, RepositoryError>;
    fn all(&self) -> Result<Vec<EmailLog>, RepositoryError>;
    fn by_appointment(&self, id: AppointmentId) -> Result<Vec<EmailLog>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {key} already registered")]
    Duplicate { entity: &'static str, key: String },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
