use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::MailCredentials;
use crate::scheduling::domain::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentRequest, Customer, EmailLog,
    EmailLogEntry, Inspector, InspectorCertification, InspectorId, Vehicle, VehicleCategory,
    VehicleId,
};
use crate::scheduling::memory::{
    InMemoryAppointmentStore, InMemoryEmailLog, InMemoryFleet, NewCustomer, NewInspector,
    NewVehicle,
};
use crate::scheduling::notification::{
    DeliveryError, InMemoryOutbox, MailTransport, NotificationCoordinator, OutboundEmail,
};
use crate::scheduling::repository::{
    AppointmentRepository, EmailLogRepository, RepositoryError,
};
use crate::scheduling::service::AppointmentService;

pub(super) fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 3)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

pub(super) fn tomorrow_at(hour: u32) -> NaiveDateTime {
    (now() + Duration::days(1))
        .date()
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}

pub(super) fn credentials() -> MailCredentials {
    MailCredentials {
        sender_email: "citas@ruedasfelices.example".to_string(),
        sender_password: "app-password".to_string(),
        sender_name: "Ruedas Felices".to_string(),
    }
}

/// Fleet with one customer owning a light car, a heavy truck and a motorcycle,
/// plus one inspector per certification (ids 1 light, 2 heavy, 3 motorcycle).
pub(super) struct Fleet {
    pub(super) directory: Arc<InMemoryFleet>,
    pub(super) customer: Customer,
    pub(super) light: Vehicle,
    pub(super) heavy: Vehicle,
    pub(super) motorcycle: Vehicle,
    pub(super) light_inspector: Inspector,
    pub(super) heavy_inspector: Inspector,
    pub(super) motorcycle_inspector: Inspector,
}

pub(super) fn fleet() -> Fleet {
    fleet_with_customer_email("laura@example.com")
}

pub(super) fn fleet_with_customer_email(email: &str) -> Fleet {
    let directory = Arc::new(InMemoryFleet::default());
    let customer = directory
        .register_customer(NewCustomer {
            name: "Laura Gomez".to_string(),
            document_id: "1001".to_string(),
            phone: "3001234567".to_string(),
            email: email.to_string(),
            address: "Calle 10 #5-20".to_string(),
        })
        .expect("customer registers");

    let vehicle = |plate: &str, brand: &str, category| {
        directory
            .register_vehicle(NewVehicle {
                license_plate: plate.to_string(),
                brand: brand.to_string(),
                model: "Base".to_string(),
                year: 2021,
                category,
                owner: customer.id,
            })
            .expect("vehicle registers")
    };
    let light = vehicle("ABC123", "Mazda", VehicleCategory::Light);
    let heavy = vehicle("KLM456", "Kenworth", VehicleCategory::Heavy);
    let motorcycle = vehicle("XYZ98F", "Yamaha", VehicleCategory::Motorcycle);

    let inspector = |name: &str, document: &str, certification| {
        directory
            .register_inspector(NewInspector {
                name: name.to_string(),
                document_id: document.to_string(),
                phone: "3109876543".to_string(),
                email: format!("{document}@ruedasfelices.example"),
                certification,
            })
            .expect("inspector registers")
    };
    let light_inspector = inspector("Carlos Ruiz", "2001", InspectorCertification::Light);
    let heavy_inspector = inspector("Marta Diaz", "2002", InspectorCertification::Heavy);
    let motorcycle_inspector =
        inspector("Andres Mora", "2003", InspectorCertification::Motorcycle);

    Fleet {
        directory,
        customer,
        light,
        heavy,
        motorcycle,
        light_inspector,
        heavy_inspector,
        motorcycle_inspector,
    }
}

pub(super) fn request(vehicle: &Vehicle, inspector: &Inspector, at: NaiveDateTime) -> AppointmentRequest {
    AppointmentRequest {
        vehicle_id: vehicle.id,
        inspector_id: inspector.id,
        scheduled_for: at,
    }
}

pub(super) struct Harness {
    pub(super) fleet: Fleet,
    pub(super) appointments: Arc<InMemoryAppointmentStore>,
    pub(super) logs: Arc<InMemoryEmailLog>,
    pub(super) outbox: Arc<InMemoryOutbox>,
    pub(super) service: AppointmentService<InMemoryFleet, InMemoryAppointmentStore>,
}

pub(super) fn harness() -> Harness {
    harness_with(fleet(), Some(credentials()))
}

pub(super) fn harness_with(fleet: Fleet, credentials: Option<MailCredentials>) -> Harness {
    let appointments = Arc::new(InMemoryAppointmentStore::default());
    let logs = Arc::new(InMemoryEmailLog::default());
    let outbox = Arc::new(InMemoryOutbox::default());
    let notifier = NotificationCoordinator::with_credentials(
        credentials,
        "Ruedas Felices",
        outbox.clone(),
        logs.clone(),
    );
    let service = AppointmentService::new(fleet.directory.clone(), appointments.clone(), notifier);
    Harness {
        fleet,
        appointments,
        logs,
        outbox,
        service,
    }
}

pub(super) fn snapshot(store: &InMemoryAppointmentStore) -> Vec<Appointment> {
    store.all().expect("store readable")
}

#[derive(Debug)]
pub(super) struct RejectingTransport(pub(super) &'static str);

impl MailTransport for RejectingTransport {
    fn send(&self, _sender: &MailCredentials, _email: &OutboundEmail) -> Result<(), DeliveryError> {
        Err(DeliveryError::Rejected(self.0.to_string()))
    }
}

/// Transport that counts attempts so tests can assert nothing was sent.
#[derive(Debug, Default)]
pub(super) struct CountingTransport {
    pub(super) attempts: Mutex<usize>,
}

impl CountingTransport {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("counter mutex poisoned")
    }
}

impl MailTransport for CountingTransport {
    fn send(&self, _sender: &MailCredentials, _email: &OutboundEmail) -> Result<(), DeliveryError> {
        *self.attempts.lock().expect("counter mutex poisoned") += 1;
        Ok(())
    }
}

pub(super) struct UnavailableLogStore;

impl EmailLogRepository for UnavailableLogStore {
    fn append(&self, _entry: EmailLogEntry) -> Result<EmailLog, RepositoryError> {
        Err(RepositoryError::Unavailable("log volume offline".to_string()))
    }

    fn all(&self) -> Result<Vec<EmailLog>, RepositoryError> {
        Err(RepositoryError::Unavailable("log volume offline".to_string()))
    }

    fn by_appointment(&self, _id: AppointmentId) -> Result<Vec<EmailLog>, RepositoryError> {
        Err(RepositoryError::Unavailable("log volume offline".to_string()))
    }
}

pub(super) struct UnavailableAppointmentStore;

impl AppointmentRepository for UnavailableAppointmentStore {
    fn insert(&self, _draft: AppointmentDraft) -> Result<Appointment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _appointment: &Appointment) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Appointment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_vehicle(&self, _id: VehicleId) -> Result<Vec<Appointment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_inspector(&self, _id: InspectorId) -> Result<Vec<Appointment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn has_conflict_for_inspector(
        &self,
        _id: InspectorId,
        _at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn has_conflict_for_vehicle(
        &self,
        _id: VehicleId,
        _at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
