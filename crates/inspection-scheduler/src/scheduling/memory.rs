//! Mutex-guarded in-memory stores backing the service, the demo and the tests.
//!
//! Each store owns its identity counter; ids start at 1.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{
    Appointment, AppointmentDraft, AppointmentId, Customer, CustomerId, EmailLog, EmailLogEntry,
    EmailLogId, Inspector, InspectorCertification, InspectorId, Vehicle, VehicleCategory,
    VehicleId,
};
use super::repository::{
    AppointmentRepository, EmailLogRepository, FleetDirectory, RepositoryError,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

fn same_key(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub document_id: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub category: VehicleCategory,
    pub owner: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInspector {
    pub name: String,
    pub document_id: String,
    pub phone: String,
    pub email: String,
    pub certification: InspectorCertification,
}

#[derive(Debug, Default)]
struct FleetState {
    customers: Sequenced<CustomerId, Customer>,
    vehicles: Sequenced<VehicleId, Vehicle>,
    inspectors: Sequenced<InspectorId, Inspector>,
}

impl FleetState {
    fn document_taken(&self, document_id: &str) -> Option<&'static str> {
        if self
            .customers
            .records
            .values()
            .any(|customer| same_key(&customer.document_id, document_id))
        {
            return Some("customer");
        }
        if self
            .inspectors
            .records
            .values()
            .any(|inspector| same_key(&inspector.document_id, document_id))
        {
            return Some("inspector");
        }
        None
    }
}

/// Registration-side directory of customers, vehicles and inspectors.
///
/// Document ids are unique across customers and inspectors; license plates are unique.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    state: Mutex<FleetState>,
}

impl InMemoryFleet {
    pub fn register_customer(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut state = lock(&self.state, "fleet")?;
        if let Some(owner) = state.document_taken(&customer.document_id) {
            return Err(RepositoryError::Duplicate {
                entity: owner,
                key: format!("document {}", customer.document_id.trim()),
            });
        }

        let id = CustomerId(state.customers.take_id());
        let record = Customer {
            id,
            name: customer.name,
            document_id: customer.document_id.trim().to_string(),
            phone: customer.phone,
            email: customer.email.trim().to_string(),
            address: customer.address,
        };
        state.customers.records.insert(id, record.clone());
        Ok(record)
    }

    pub fn register_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, RepositoryError> {
        let mut state = lock(&self.state, "fleet")?;
        if !state.customers.records.contains_key(&vehicle.owner) {
            return Err(RepositoryError::NotFound);
        }
        if state
            .vehicles
            .records
            .values()
            .any(|existing| same_key(&existing.license_plate, &vehicle.license_plate))
        {
            return Err(RepositoryError::Duplicate {
                entity: "vehicle",
                key: format!("plate {}", vehicle.license_plate.trim()),
            });
        }

        let id = VehicleId(state.vehicles.take_id());
        let record = Vehicle {
            id,
            license_plate: vehicle.license_plate.trim().to_ascii_uppercase(),
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            category: vehicle.category,
            owner: vehicle.owner,
        };
        state.vehicles.records.insert(id, record.clone());
        Ok(record)
    }

    pub fn register_inspector(&self, inspector: NewInspector) -> Result<Inspector, RepositoryError> {
        let mut state = lock(&self.state, "fleet")?;
        if let Some(owner) = state.document_taken(&inspector.document_id) {
            return Err(RepositoryError::Duplicate {
                entity: owner,
                key: format!("document {}", inspector.document_id.trim()),
            });
        }

        let id = InspectorId(state.inspectors.take_id());
        let record = Inspector {
            id,
            name: inspector.name,
            document_id: inspector.document_id.trim().to_string(),
            phone: inspector.phone,
            email: inspector.email,
            certification: inspector.certification,
        };
        state.inspectors.records.insert(id, record.clone());
        Ok(record)
    }

    pub fn customer_by_document(&self, document_id: &str) -> Result<Option<Customer>, RepositoryError> {
        let state = lock(&self.state, "fleet")?;
        Ok(state
            .customers
            .records
            .values()
            .find(|customer| same_key(&customer.document_id, document_id))
            .cloned())
    }
}

impl FleetDirectory for InMemoryFleet {
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(lock(&self.state, "fleet")?.customers.records.get(&id).cloned())
    }

    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        Ok(lock(&self.state, "fleet")?.vehicles.records.get(&id).cloned())
    }

    fn inspector(&self, id: InspectorId) -> Result<Option<Inspector>, RepositoryError> {
        Ok(lock(&self.state, "fleet")?.inspectors.records.get(&id).cloned())
    }

    fn vehicles_for_customer(&self, id: CustomerId) -> Result<Vec<Vehicle>, RepositoryError> {
        let state = lock(&self.state, "fleet")?;
        Ok(state
            .vehicles
            .records
            .values()
            .filter(|vehicle| vehicle.owner == id)
            .cloned()
            .collect())
    }

    fn inspectors_certified_for(
        &self,
        certification: InspectorCertification,
    ) -> Result<Vec<Inspector>, RepositoryError> {
        let state = lock(&self.state, "fleet")?;
        Ok(state
            .inspectors
            .records
            .values()
            .filter(|inspector| inspector.certification == certification)
            .cloned()
            .collect())
    }
}

#[derive(Debug)]
struct Sequenced<K, V> {
    next_id: u32,
    records: BTreeMap<K, V>,
}

impl<K, V> Default for Sequenced<K, V> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

impl<K, V> Sequenced<K, V> {
    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    state: Mutex<Sequenced<AppointmentId, Appointment>>,
}

impl InMemoryAppointmentStore {
    fn select(
        &self,
        keep: impl Fn(&Appointment) -> bool,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let state = lock(&self.state, "appointment store")?;
        Ok(state
            .records
            .values()
            .filter(|appointment| keep(appointment))
            .cloned()
            .collect())
    }
}

impl AppointmentRepository for InMemoryAppointmentStore {
    fn insert(&self, draft: AppointmentDraft) -> Result<Appointment, RepositoryError> {
        let mut state = lock(&self.state, "appointment store")?;
        let id = AppointmentId(state.take_id());
        let appointment = Appointment::from_draft(id, draft);
        state.records.insert(id, appointment.clone());
        Ok(appointment)
    }

    fn update(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state, "appointment store")?;
        let existing = state
            .records
            .get_mut(&appointment.id)
            .ok_or(RepositoryError::NotFound)?;
        existing.status = appointment.status;
        existing.scheduled_for = appointment.scheduled_for;
        Ok(())
    }

    fn fetch(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        Ok(lock(&self.state, "appointment store")?
            .records
            .get(&id)
            .cloned())
    }

    fn all(&self) -> Result<Vec<Appointment>, RepositoryError> {
        self.select(|_| true)
    }

    fn by_vehicle(&self, id: VehicleId) -> Result<Vec<Appointment>, RepositoryError> {
        self.select(|appointment| appointment.vehicle_id == id)
    }

    fn by_inspector(&self, id: InspectorId) -> Result<Vec<Appointment>, RepositoryError> {
        self.select(|appointment| appointment.inspector_id == id)
    }

    fn has_conflict_for_inspector(
        &self,
        id: InspectorId,
        at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        let state = lock(&self.state, "appointment store")?;
        Ok(state
            .records
            .values()
            .any(|appointment| appointment.blocks_inspector(id, at)))
    }

    fn has_conflict_for_vehicle(
        &self,
        id: VehicleId,
        at: NaiveDateTime,
    ) -> Result<bool, RepositoryError> {
        let state = lock(&self.state, "appointment store")?;
        Ok(state
            .records
            .values()
            .any(|appointment| appointment.blocks_vehicle(id, at)))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEmailLog {
    state: Mutex<Sequenced<EmailLogId, EmailLog>>,
}

impl EmailLogRepository for InMemoryEmailLog {
    fn append(&self, entry: EmailLogEntry) -> Result<EmailLog, RepositoryError> {
        let mut state = lock(&self.state, "email log")?;
        let id = EmailLogId(state.take_id());
        let log = EmailLog::from_entry(id, entry);
        state.records.insert(id, log.clone());
        Ok(log)
    }

    fn all(&self) -> Result<Vec<EmailLog>, RepositoryError> {
        Ok(lock(&self.state, "email log")?
            .records
            .values()
            .cloned()
            .collect())
    }

    fn by_appointment(&self, id: AppointmentId) -> Result<Vec<EmailLog>, RepositoryError> {
        let state = lock(&self.state, "email log")?;
        Ok(state
            .records
            .values()
            .filter(|log| log.appointment_id == id)
            .cloned()
            .collect())
    }
}
