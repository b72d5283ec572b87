use crate::infra::{AppState, Scheduler};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use inspection_scheduler::error::AppError;
use inspection_scheduler::scheduling::{scheduling_router, AppointmentStatus};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Appointment and confirmation totals for the operations dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CenterSummary {
    pub(crate) appointments: usize,
    pub(crate) scheduled: usize,
    pub(crate) completed: usize,
    pub(crate) cancelled: usize,
    pub(crate) confirmations_sent: usize,
    pub(crate) confirmations_failed: usize,
    pub(crate) mail_configured: bool,
}

pub(crate) fn with_operational_routes(scheduler: Arc<Scheduler>) -> axum::Router {
    scheduling_router(scheduler)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/summary", axum::routing::get(summary_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<CenterSummary>, AppError> {
    Ok(Json(summarize(&state.scheduler)?))
}

pub(crate) fn summarize(scheduler: &Scheduler) -> Result<CenterSummary, AppError> {
    let appointments = scheduler.list()?;
    let logs = scheduler.email_history()?;
    let with_status =
        |status| appointments.iter().filter(|appointment| appointment.status == status).count();
    let confirmations_sent = logs.iter().filter(|log| log.was_sent).count();

    Ok(CenterSummary {
        appointments: appointments.len(),
        scheduled: with_status(AppointmentStatus::Scheduled),
        completed: with_status(AppointmentStatus::Completed),
        cancelled: with_status(AppointmentStatus::Cancelled),
        confirmations_sent,
        confirmations_failed: logs.len() - confirmations_sent,
        mail_configured: scheduler.notifier().is_configured(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{mail_without_credentials, InspectionCenter, RosterSource};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Local};
    use inspection_scheduler::scheduling::{AppointmentRequest, InspectorId, VehicleId};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(center: &InspectionCenter) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            scheduler: center.scheduler.clone(),
        }
    }

    fn seeded_center() -> InspectionCenter {
        let center = InspectionCenter::new(&mail_without_credentials());
        center
            .load_roster(RosterSource::Sample)
            .expect("sample roster imports");
        center
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let center = seeded_center();
        let state = state(&center);

        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_counts_bookings_and_unsent_confirmations() {
        let center = seeded_center();
        let tomorrow = Local::now().naive_local() + Duration::days(1);
        let receipt = center
            .scheduler
            .book(AppointmentRequest {
                vehicle_id: VehicleId(1),
                inspector_id: InspectorId(1),
                scheduled_for: tomorrow,
            })
            .expect("booking");
        center
            .scheduler
            .book(AppointmentRequest {
                vehicle_id: VehicleId(3),
                inspector_id: InspectorId(2),
                scheduled_for: tomorrow,
            })
            .expect("booking");
        center
            .scheduler
            .cancel(receipt.appointment.id)
            .expect("cancels");

        let Json(summary) = summary_endpoint(Extension(state(&center)))
            .await
            .expect("summary builds");

        assert_eq!(
            summary,
            CenterSummary {
                appointments: 2,
                scheduled: 1,
                completed: 0,
                cancelled: 1,
                confirmations_sent: 0,
                confirmations_failed: 2,
                mail_configured: false,
            }
        );
    }

    #[tokio::test]
    async fn operational_routes_sit_beside_scheduling_routes() {
        let center = seeded_center();
        let app = with_operational_routes(center.scheduler.clone())
            .layer(Extension(state(&center)));

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let pool = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/vehicles/1/inspectors")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(pool.status(), StatusCode::OK);
        assert_eq!(body_json(pool).await.as_array().map(Vec::len), Some(2));

        let summary = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/summary")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(summary.status(), StatusCode::OK);
        assert_eq!(body_json(summary).await["appointments"], 0);
    }
}
