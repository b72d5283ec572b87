use inspection_scheduler::config::MailConfig;
use inspection_scheduler::error::AppError;
use inspection_scheduler::scheduling::{
    AppointmentService, InMemoryAppointmentStore, InMemoryEmailLog, InMemoryFleet,
    InMemoryOutbox, MailTransport, NotificationCoordinator, RosterImporter, RosterSummary,
    SmtpMailer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Scheduler = AppointmentService<InMemoryFleet, InMemoryAppointmentStore>;

const SAMPLE_CUSTOMERS: &str = include_str!("../data/customers.csv");
const SAMPLE_VEHICLES: &str = include_str!("../data/vehicles.csv");
const SAMPLE_INSPECTORS: &str = include_str!("../data/inspectors.csv");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) scheduler: Arc<Scheduler>,
}

/// Where the fleet directory gets its customers, vehicles and inspectors.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RosterSource<'a> {
    Directory(&'a Path),
    Sample,
}

/// In-memory inspection center: fleet directory, stores and the booking service.
///
/// `outbox` only receives mail when the center was built with [`InspectionCenter::with_outbox`].
pub(crate) struct InspectionCenter {
    pub(crate) fleet: Arc<InMemoryFleet>,
    pub(crate) outbox: Arc<InMemoryOutbox>,
    pub(crate) scheduler: Arc<Scheduler>,
}

impl InspectionCenter {
    /// Confirmations go out through the configured SMTP relay.
    pub(crate) fn new(mail: &MailConfig) -> Self {
        let relay: Arc<dyn MailTransport> = Arc::new(SmtpMailer::from_config(mail));
        Self::assemble(mail, Arc::new(InMemoryOutbox::default()), relay)
    }

    /// Confirmations stay in the in-memory outbox.
    pub(crate) fn with_outbox(mail: &MailConfig) -> Self {
        let outbox = Arc::new(InMemoryOutbox::default());
        Self::assemble(mail, outbox.clone(), outbox)
    }

    fn assemble(
        mail: &MailConfig,
        outbox: Arc<InMemoryOutbox>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let fleet = Arc::new(InMemoryFleet::default());
        let logs = Arc::new(InMemoryEmailLog::default());
        let notifier = NotificationCoordinator::new(mail, transport, logs);
        let scheduler = Arc::new(AppointmentService::new(
            fleet.clone(),
            Arc::new(InMemoryAppointmentStore::default()),
            notifier,
        ));

        Self {
            fleet,
            outbox,
            scheduler,
        }
    }

    pub(crate) fn load_roster(&self, source: RosterSource<'_>) -> Result<RosterSummary, AppError> {
        let summary = match source {
            RosterSource::Directory(dir) => RosterImporter::from_dir(dir, &self.fleet)?,
            RosterSource::Sample => RosterImporter::from_readers(
                SAMPLE_CUSTOMERS.as_bytes(),
                SAMPLE_VEHICLES.as_bytes(),
                SAMPLE_INSPECTORS.as_bytes(),
                &self.fleet,
            )?,
        };
        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) fn mail_without_credentials() -> MailConfig {
    MailConfig {
        smtp_host: "smtp.gmail.com".to_string(),
        smtp_port: 587,
        sender_email: String::new(),
        sender_password: String::new(),
        sender_name: "Ruedas Felices".to_string(),
    }
}
