use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::domain::{
    Appointment, AppointmentId, AppointmentRequest, CustomerId, EmailLog, Inspector, InspectorId,
    VehicleId,
};
use super::engine::{RecordKind, SchedulingEngine, SchedulingError};
use super::notification::NotificationCoordinator;
use super::repository::{AppointmentRepository, FleetDirectory};

/// Result of a successful booking: the stored appointment and its confirmation record.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub email_log: EmailLog,
}

/// Facade composing the scheduling engine with confirmation notices.
pub struct AppointmentService<D, R> {
    engine: SchedulingEngine<D, R>,
    notifier: NotificationCoordinator,
}

impl<D, R> AppointmentService<D, R>
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    pub fn new(directory: Arc<D>, appointments: Arc<R>, notifier: NotificationCoordinator) -> Self {
        Self {
            engine: SchedulingEngine::new(directory, appointments),
            notifier,
        }
    }

    pub fn engine(&self) -> &SchedulingEngine<D, R> {
        &self.engine
    }

    pub fn notifier(&self) -> &NotificationCoordinator {
        &self.notifier
    }

    /// Books against the local wall clock.
    pub fn book(&self, request: AppointmentRequest) -> Result<BookingReceipt, SchedulingError> {
        self.book_at(request, Local::now().naive_local())
    }

    /// Schedules the appointment, then sends the confirmation as a best-effort side effect.
    pub fn book_at(
        &self,
        request: AppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<BookingReceipt, SchedulingError> {
        let appointment = self.engine.schedule(request, now)?;
        let email_log = self.confirm(&appointment, now);
        Ok(BookingReceipt {
            appointment,
            email_log,
        })
    }

    fn confirm(&self, appointment: &Appointment, now: NaiveDateTime) -> EmailLog {
        let parties = self.engine.resolve_vehicle(appointment.vehicle_id).and_then(|vehicle| {
            let inspector = self.engine.resolve_inspector(appointment.inspector_id)?;
            let customer = self
                .engine
                .directory()
                .customer(vehicle.owner)?
                .ok_or(SchedulingError::NotFound {
                    kind: RecordKind::Customer,
                    id: vehicle.owner.0,
                })?;
            Ok((customer, vehicle, inspector))
        });

        match parties {
            Ok((customer, vehicle, inspector)) => {
                self.notifier
                    .notify(appointment, &customer, &vehicle, &inspector, now)
            }
            Err(err) => self.notifier.record_failure(appointment, err.to_string(), now),
        }
    }

    pub fn cancel(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.engine.cancel(id)
    }

    pub fn complete(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.engine.complete(id)
    }

    pub fn get(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.engine.get(id)
    }

    pub fn list(&self) -> Result<Vec<Appointment>, SchedulingError> {
        self.engine.list()
    }

    pub fn list_for_vehicle(&self, id: VehicleId) -> Result<Vec<Appointment>, SchedulingError> {
        self.engine.list_for_vehicle(id)
    }

    pub fn list_for_inspector(
        &self,
        id: InspectorId,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.engine.list_for_inspector(id)
    }

    pub fn list_for_customer(&self, id: CustomerId) -> Result<Vec<Appointment>, SchedulingError> {
        self.engine.list_for_customer(id)
    }

    pub fn compatible_inspectors(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Vec<Inspector>, SchedulingError> {
        self.engine.compatible_inspectors(vehicle_id)
    }

    pub fn email_history(&self) -> Result<Vec<EmailLog>, SchedulingError> {
        Ok(self.notifier.logs().all()?)
    }

    /// Confirmation attempts for one appointment; unknown ids are `NotFound`.
    pub fn email_history_for(&self, id: AppointmentId) -> Result<Vec<EmailLog>, SchedulingError> {
        self.engine.get(id)?;
        Ok(self.notifier.logs().by_appointment(id)?)
    }
}
