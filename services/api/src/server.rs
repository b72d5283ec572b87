use crate::cli::ServeArgs;
use crate::infra::{AppState, InspectionCenter, RosterSource};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use inspection_scheduler::config::AppConfig;
use inspection_scheduler::error::AppError;
use inspection_scheduler::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let center = InspectionCenter::new(&config.mail);
    let source = match args.roster_dir.as_deref() {
        Some(dir) => RosterSource::Directory(dir),
        None => RosterSource::Sample,
    };
    let roster = center.load_roster(source)?;
    info!(
        customers = roster.customers,
        vehicles = roster.vehicles,
        inspectors = roster.inspectors,
        "fleet directory seeded"
    );
    if !center.scheduler.notifier().is_configured() {
        warn!("SMTP_EMAIL or SMTP_PASSWORD missing; confirmations will be logged as unsent");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        scheduler: center.scheduler.clone(),
    };

    let app = with_operational_routes(center.scheduler.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "inspection scheduler ready");

    axum::serve(listener, app).await?;
    Ok(())
}
