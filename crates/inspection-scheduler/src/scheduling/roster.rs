//! CSV roster import used to seed the in-memory fleet directory.
//!
//! Three files are read: `customers.csv`, `vehicles.csv` and `inspectors.csv`.
//! Vehicles name their owner by customer document id.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use super::domain::{InspectorCertification, VehicleCategory};
use super::memory::{InMemoryFleet, NewCustomer, NewInspector, NewVehicle};
use super::repository::RepositoryError;

pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const VEHICLES_FILE: &str = "vehicles.csv";
pub const INSPECTORS_FILE: &str = "inspectors.csv";

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("unable to open roster file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: invalid row: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("{file} line {line}: owner document '{document_id}' is not a registered customer")]
    UnknownOwner {
        file: &'static str,
        line: usize,
        document_id: String,
    },
    #[error("{file} line {line}: {source}")]
    Rejected {
        file: &'static str,
        line: usize,
        #[source]
        source: RepositoryError,
    },
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    name: String,
    document_id: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
struct VehicleRow {
    license_plate: String,
    brand: String,
    model: String,
    year: u16,
    category: VehicleCategory,
    owner_document_id: String,
}

#[derive(Debug, Deserialize)]
struct InspectorRow {
    name: String,
    document_id: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    certification: InspectorCertification,
}

/// Counts of records registered by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterSummary {
    pub customers: usize,
    pub vehicles: usize,
    pub inspectors: usize,
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_dir(dir: impl AsRef<Path>, fleet: &InMemoryFleet) -> Result<RosterSummary, RosterError> {
        let dir = dir.as_ref();
        let open = |name: &str| {
            let path = dir.join(name);
            File::open(&path).map_err(|source| RosterError::Open { path, source })
        };

        Self::from_readers(
            open(CUSTOMERS_FILE)?,
            open(VEHICLES_FILE)?,
            open(INSPECTORS_FILE)?,
            fleet,
        )
    }

    /// Registers customers first so vehicles can resolve their owners.
    pub fn from_readers<C, V, I>(
        customers: C,
        vehicles: V,
        inspectors: I,
        fleet: &InMemoryFleet,
    ) -> Result<RosterSummary, RosterError>
    where
        C: Read,
        V: Read,
        I: Read,
    {
        let mut summary = RosterSummary::default();

        for (line, row) in rows::<CustomerRow, _>(customers, CUSTOMERS_FILE)? {
            fleet
                .register_customer(NewCustomer {
                    name: row.name,
                    document_id: row.document_id,
                    phone: row.phone,
                    email: row.email,
                    address: row.address,
                })
                .map_err(|source| RosterError::Rejected {
                    file: CUSTOMERS_FILE,
                    line,
                    source,
                })?;
            summary.customers += 1;
        }

        for (line, row) in rows::<VehicleRow, _>(vehicles, VEHICLES_FILE)? {
            let owner = fleet
                .customer_by_document(&row.owner_document_id)
                .map_err(|source| RosterError::Rejected {
                    file: VEHICLES_FILE,
                    line,
                    source,
                })?
                .ok_or_else(|| RosterError::UnknownOwner {
                    file: VEHICLES_FILE,
                    line,
                    document_id: row.owner_document_id.clone(),
                })?;

            fleet
                .register_vehicle(NewVehicle {
                    license_plate: row.license_plate,
                    brand: row.brand,
                    model: row.model,
                    year: row.year,
                    category: row.category,
                    owner: owner.id,
                })
                .map_err(|source| RosterError::Rejected {
                    file: VEHICLES_FILE,
                    line,
                    source,
                })?;
            summary.vehicles += 1;
        }

        for (line, row) in rows::<InspectorRow, _>(inspectors, INSPECTORS_FILE)? {
            fleet
                .register_inspector(NewInspector {
                    name: row.name,
                    document_id: row.document_id,
                    phone: row.phone,
                    email: row.email,
                    certification: row.certification,
                })
                .map_err(|source| RosterError::Rejected {
                    file: INSPECTORS_FILE,
                    line,
                    source,
                })?;
            summary.inspectors += 1;
        }

        info!(
            customers = summary.customers,
            vehicles = summary.vehicles,
            inspectors = summary.inspectors,
            "roster imported"
        );
        Ok(summary)
    }
}

/// Parses every row up front, pairing each with its 1-based line number (header is line 1).
fn rows<T, R>(reader: R, file: &'static str) -> Result<Vec<(usize, T)>, RosterError>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<T>()
        .enumerate()
        .map(|(index, row)| {
            row.map(|value| (index + 2, value))
                .map_err(|source| RosterError::Csv { file, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::repository::FleetDirectory;
    use crate::scheduling::domain::{CustomerId, VehicleId};

    const CUSTOMERS: &str = "name,document_id,phone,email,address\n\
        Laura Gomez,1001,3001234567,laura@example.com,Calle 10 #5-20\n";
    const VEHICLES: &str = "license_plate,brand,model,year,category,owner_document_id\n\
        abc123,Mazda,3,2020,light,1001\n\
        XYZ98F,Yamaha,MT-03,2022,motorcycle,1001\n";
    const INSPECTORS: &str = "name,document_id,phone,email,certification\n\
        Carlos Ruiz,2001,3109876543,carlos@example.com,light\n";

    #[test]
    fn imports_all_three_files() {
        let fleet = InMemoryFleet::default();
        let summary = RosterImporter::from_readers(
            CUSTOMERS.as_bytes(),
            VEHICLES.as_bytes(),
            INSPECTORS.as_bytes(),
            &fleet,
        )
        .expect("roster imports");

        assert_eq!(
            summary,
            RosterSummary {
                customers: 1,
                vehicles: 2,
                inspectors: 1
            }
        );
        let vehicle = fleet
            .vehicle(VehicleId(1))
            .expect("lookup")
            .expect("vehicle present");
        assert_eq!(vehicle.license_plate, "ABC123");
        assert_eq!(vehicle.owner, CustomerId(1));
        assert_eq!(vehicle.category, VehicleCategory::Light);
    }

    #[test]
    fn rejects_vehicle_with_unknown_owner() {
        let fleet = InMemoryFleet::default();
        let vehicles = "license_plate,brand,model,year,category,owner_document_id\n\
            KLM456,Kenworth,T800,2018,heavy,9999\n";

        match RosterImporter::from_readers(
            CUSTOMERS.as_bytes(),
            vehicles.as_bytes(),
            INSPECTORS.as_bytes(),
            &fleet,
        ) {
            Err(RosterError::UnknownOwner {
                line, document_id, ..
            }) => {
                assert_eq!(line, 2);
                assert_eq!(document_id, "9999");
            }
            other => panic!("expected unknown owner, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inspector_reusing_customer_document() {
        let fleet = InMemoryFleet::default();
        let inspectors = "name,document_id,phone,email,certification\n\
            Laura Gomez,1001,3001234567,laura@example.com,heavy\n";

        match RosterImporter::from_readers(
            CUSTOMERS.as_bytes(),
            VEHICLES.as_bytes(),
            inspectors.as_bytes(),
            &fleet,
        ) {
            Err(RosterError::Rejected {
                file,
                source: RepositoryError::Duplicate { entity, .. },
                ..
            }) => {
                assert_eq!(file, INSPECTORS_FILE);
                assert_eq!(entity, "customer");
            }
            other => panic!("expected duplicate document, got {other:?}"),
        }
    }

    #[test]
    fn reports_unknown_category() {
        let fleet = InMemoryFleet::default();
        let vehicles = "license_plate,brand,model,year,category,owner_document_id\n\
            QWE321,Volvo,FH,2019,bus,1001\n";

        let err = RosterImporter::from_readers(
            CUSTOMERS.as_bytes(),
            vehicles.as_bytes(),
            INSPECTORS.as_bytes(),
            &fleet,
        )
        .expect_err("bus is not a category");
        assert!(matches!(err, RosterError::Csv { file: VEHICLES_FILE, .. }));
    }
}
