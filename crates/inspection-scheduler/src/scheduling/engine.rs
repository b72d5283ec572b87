use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentRequest, AppointmentStatus,
    CustomerId, Inspector, InspectorCertification, InspectorId, Vehicle, VehicleCategory,
    VehicleId,
};
use super::repository::{AppointmentRepository, FleetDirectory, RepositoryError};
use super::status::{InvalidTransition, StatusChange};

/// Kind of record a lookup failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Vehicle,
    Inspector,
    Customer,
    Appointment,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            RecordKind::Vehicle => "vehicle",
            RecordKind::Inspector => "inspector",
            RecordKind::Customer => "customer",
            RecordKind::Appointment => "appointment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a booking already holds the requested slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Inspector,
    Vehicle,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Inspector => f.write_str("inspector"),
            ConflictKind::Vehicle => f.write_str("vehicle"),
        }
    }
}

/// Error raised by the scheduling engine.
///
/// Every variant except `Internal` is a recoverable domain rejection.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: u32 },
    #[error(
        "inspector {inspector_id} is certified for {}, but a {} requires {}",
        .certification.label(),
        .category.label(),
        .category.required_certification().label()
    )]
    CapabilityMismatch {
        inspector_id: InspectorId,
        certification: InspectorCertification,
        category: VehicleCategory,
    },
    #[error("appointment time {requested} must be after {now}")]
    InvalidTime {
        requested: NaiveDateTime,
        now: NaiveDateTime,
    },
    #[error("{kind} already has an appointment at {at}")]
    Conflict { kind: ConflictKind, at: NaiveDateTime },
    #[error("appointment {id}: {source}")]
    InvalidStateTransition {
        id: AppointmentId,
        #[source]
        source: InvalidTransition,
    },
    #[error("scheduling store failure: {0}")]
    Internal(#[from] RepositoryError),
}

impl SchedulingError {
    fn not_found(kind: RecordKind, id: u32) -> Self {
        Self::NotFound { kind, id }
    }

    /// True for rejections the caller can correct, false for store failures.
    pub fn is_domain(&self) -> bool {
        !matches!(self, SchedulingError::Internal(_))
    }
}

/// Decision core: capability matching, conflict detection and status transitions.
///
/// Conflict checks and the insert run under one admission lock so concurrent
/// callers cannot both pass the checks for the same slot.
pub struct SchedulingEngine<D, R> {
    directory: Arc<D>,
    appointments: Arc<R>,
    admission: Mutex<()>,
}

impl<D, R> SchedulingEngine<D, R>
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    pub fn new(directory: Arc<D>, appointments: Arc<R>) -> Self {
        Self {
            directory,
            appointments,
            admission: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    fn admission_guard(&self) -> Result<MutexGuard<'_, ()>, SchedulingError> {
        self.admission.lock().map_err(|_| {
            SchedulingError::Internal(RepositoryError::Unavailable(
                "admission lock poisoned".to_string(),
            ))
        })
    }

    pub fn resolve_vehicle(&self, id: VehicleId) -> Result<Vehicle, SchedulingError> {
        self.directory
            .vehicle(id)?
            .ok_or_else(|| SchedulingError::not_found(RecordKind::Vehicle, id.0))
    }

    pub fn resolve_inspector(&self, id: InspectorId) -> Result<Inspector, SchedulingError> {
        self.directory
            .inspector(id)?
            .ok_or_else(|| SchedulingError::not_found(RecordKind::Inspector, id.0))
    }

    /// Inspectors whose certification matches the vehicle's category.
    pub fn compatible_inspectors(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Vec<Inspector>, SchedulingError> {
        let vehicle = self.resolve_vehicle(vehicle_id)?;
        let pool = self
            .directory
            .inspectors_certified_for(vehicle.category.required_certification())?;
        Ok(pool)
    }

    /// Admits `request` if every rule passes, in a fixed order:
    /// vehicle, inspector, capability, time, inspector slot, vehicle slot.
    pub fn schedule(
        &self,
        request: AppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<Appointment, SchedulingError> {
        let vehicle = self.resolve_vehicle(request.vehicle_id)?;
        let inspector = self.resolve_inspector(request.inspector_id)?;

        if !inspector.can_inspect(&vehicle) {
            warn!(
                vehicle = %vehicle.id,
                inspector = %inspector.id,
                category = vehicle.category.label(),
                certification = inspector.certification.label(),
                "rejected appointment: capability mismatch"
            );
            return Err(SchedulingError::CapabilityMismatch {
                inspector_id: inspector.id,
                certification: inspector.certification,
                category: vehicle.category,
            });
        }

        if request.scheduled_for <= now {
            debug!(requested = %request.scheduled_for, %now, "rejected appointment: not in the future");
            return Err(SchedulingError::InvalidTime {
                requested: request.scheduled_for,
                now,
            });
        }

        let _admission = self.admission_guard()?;

        if self
            .appointments
            .has_conflict_for_inspector(inspector.id, request.scheduled_for)?
        {
            warn!(inspector = %inspector.id, at = %request.scheduled_for, "rejected appointment: inspector slot taken");
            return Err(SchedulingError::Conflict {
                kind: ConflictKind::Inspector,
                at: request.scheduled_for,
            });
        }

        if self
            .appointments
            .has_conflict_for_vehicle(vehicle.id, request.scheduled_for)?
        {
            warn!(vehicle = %vehicle.id, at = %request.scheduled_for, "rejected appointment: vehicle slot taken");
            return Err(SchedulingError::Conflict {
                kind: ConflictKind::Vehicle,
                at: request.scheduled_for,
            });
        }

        let appointment = self.appointments.insert(AppointmentDraft {
            vehicle_id: vehicle.id,
            inspector_id: inspector.id,
            scheduled_for: request.scheduled_for,
            created_at: now,
        })?;

        info!(
            appointment = %appointment.id,
            vehicle = %appointment.vehicle_id,
            inspector = %appointment.inspector_id,
            at = %appointment.scheduled_for,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    pub fn cancel(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.transition(id, StatusChange::Cancel)
    }

    pub fn complete(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.transition(id, StatusChange::Complete)
    }

    pub fn transition(
        &self,
        id: AppointmentId,
        change: StatusChange,
    ) -> Result<Appointment, SchedulingError> {
        let _admission = self.admission_guard()?;
        let mut appointment = self.get(id)?;

        let next = appointment.status.apply(change).map_err(|source| {
            warn!(appointment = %id, current = %source.current, action = change.label(), "rejected status change");
            SchedulingError::InvalidStateTransition { id, source }
        })?;

        appointment.status = next;
        self.appointments.update(&appointment)?;
        info!(appointment = %id, status = %next, "appointment status changed");
        Ok(appointment)
    }

    pub fn get(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.appointments
            .fetch(id)?
            .ok_or_else(|| SchedulingError::not_found(RecordKind::Appointment, id.0))
    }

    pub fn list(&self) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.all()?)
    }

    pub fn list_for_vehicle(&self, id: VehicleId) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.by_vehicle(id)?)
    }

    pub fn list_for_inspector(
        &self,
        id: InspectorId,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.by_inspector(id)?)
    }

    /// Every appointment booked for any vehicle the customer owns.
    pub fn list_for_customer(&self, id: CustomerId) -> Result<Vec<Appointment>, SchedulingError> {
        let vehicles = self.directory.vehicles_for_customer(id)?;
        let mut appointments = Vec::new();
        for vehicle in vehicles {
            appointments.extend(self.appointments.by_vehicle(vehicle.id)?);
        }
        appointments.sort_by_key(|appointment| appointment.id);
        Ok(appointments)
    }

    pub fn scheduled_count(&self) -> Result<usize, SchedulingError> {
        Ok(self
            .appointments
            .all()?
            .iter()
            .filter(|appointment| appointment.status == AppointmentStatus::Scheduled)
            .count())
    }
}
