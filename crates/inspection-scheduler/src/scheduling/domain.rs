use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a registered customer.
    CustomerId
);
record_id!(
    /// Identifier of a registered vehicle.
    VehicleId
);
record_id!(
    /// Identifier of a registered inspector.
    InspectorId
);
record_id!(
    /// Identifier assigned by the appointment store.
    AppointmentId
);
record_id!(
    /// Identifier assigned by the email log store.
    EmailLogId
);

impl EmailLogId {
    /// Marker for a log record the store failed to persist.
    pub const UNASSIGNED: EmailLogId = EmailLogId(0);
}

/// Vehicle classes accepted by the inspection center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Motorcycle,
    Light,
    Heavy,
}

impl VehicleCategory {
    /// The only certification allowed to inspect this class of vehicle.
    pub const fn required_certification(self) -> InspectorCertification {
        match self {
            VehicleCategory::Motorcycle => InspectorCertification::Motorcycle,
            VehicleCategory::Light => InspectorCertification::Light,
            VehicleCategory::Heavy => InspectorCertification::Heavy,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            VehicleCategory::Motorcycle => "motorcycle",
            VehicleCategory::Light => "light vehicle",
            VehicleCategory::Heavy => "heavy vehicle",
        }
    }
}

/// Inspection class an inspector is certified for. Exactly one per inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorCertification {
    Motorcycle,
    Light,
    Heavy,
}

impl InspectorCertification {
    pub const fn label(self) -> &'static str {
        match self {
            InspectorCertification::Motorcycle => "motorcycle inspections",
            InspectorCertification::Light => "light vehicle inspections",
            InspectorCertification::Heavy => "heavy vehicle inspections",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub document_id: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub category: VehicleCategory,
    pub owner: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspector {
    pub id: InspectorId,
    pub name: String,
    pub document_id: String,
    pub phone: String,
    pub email: String,
    pub certification: InspectorCertification,
}

impl Inspector {
    pub fn can_inspect(&self, vehicle: &Vehicle) -> bool {
        self.certification == vehicle.category.required_certification()
    }
}

/// Lifecycle of an appointment. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller supplied vehicle, inspector and time triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub vehicle_id: VehicleId,
    pub inspector_id: InspectorId,
    pub scheduled_for: NaiveDateTime,
}

/// An admitted appointment before the store assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub vehicle_id: VehicleId,
    pub inspector_id: InspectorId,
    pub scheduled_for: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub vehicle_id: VehicleId,
    pub inspector_id: InspectorId,
    pub scheduled_for: NaiveDateTime,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

impl Appointment {
    pub fn from_draft(id: AppointmentId, draft: AppointmentDraft) -> Self {
        Self {
            id,
            vehicle_id: draft.vehicle_id,
            inspector_id: draft.inspector_id,
            scheduled_for: draft.scheduled_for,
            status: AppointmentStatus::Scheduled,
            created_at: draft.created_at,
        }
    }

    /// True when this appointment holds the given slot for the inspector.
    pub fn blocks_inspector(&self, inspector_id: InspectorId, at: NaiveDateTime) -> bool {
        self.status == AppointmentStatus::Scheduled
            && self.inspector_id == inspector_id
            && self.scheduled_for == at
    }

    /// True when this appointment holds the given slot for the vehicle.
    pub fn blocks_vehicle(&self, vehicle_id: VehicleId, at: NaiveDateTime) -> bool {
        self.status == AppointmentStatus::Scheduled
            && self.vehicle_id == vehicle_id
            && self.scheduled_for == at
    }
}

/// Outcome of one confirmation attempt before the log store assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailLogEntry {
    pub appointment_id: AppointmentId,
    pub recipient: String,
    pub subject: String,
    pub sent_at: NaiveDateTime,
    pub was_sent: bool,
    pub error_message: Option<String>,
}

/// Append-only audit record of a confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailLog {
    pub id: EmailLogId,
    pub appointment_id: AppointmentId,
    pub recipient: String,
    pub subject: String,
    pub sent_at: NaiveDateTime,
    pub was_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EmailLog {
    pub fn from_entry(id: EmailLogId, entry: EmailLogEntry) -> Self {
        Self {
            id,
            appointment_id: entry.appointment_id,
            recipient: entry.recipient,
            subject: entry.subject,
            sent_at: entry.sent_at,
            was_sent: entry.was_sent,
            error_message: entry.error_message,
        }
    }

    pub const fn status_label(&self) -> &'static str {
        if self.was_sent {
            "sent"
        } else {
            "failed"
        }
    }
}
