use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::error;

use super::domain::{AppointmentId, AppointmentRequest, CustomerId, InspectorId, VehicleId};
use super::engine::SchedulingError;
use super::repository::{AppointmentRepository, FleetDirectory};
use super::service::AppointmentService;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Body of `POST /api/v1/appointments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleAppointmentBody {
    pub vehicle_id: u32,
    pub inspector_id: u32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub scheduled_for: NaiveDateTime,
}

impl From<ScheduleAppointmentBody> for AppointmentRequest {
    fn from(body: ScheduleAppointmentBody) -> Self {
        AppointmentRequest {
            vehicle_id: VehicleId(body.vehicle_id),
            inspector_id: InspectorId(body.inspector_id),
            scheduled_for: body.scheduled_for,
        }
    }
}

/// Router builder exposing scheduling, status changes and email history.
pub fn scheduling_router<D, R>(service: Arc<AppointmentService<D, R>>) -> Router
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/appointments",
            post(schedule_handler::<D, R>).get(list_handler::<D, R>),
        )
        .route(
            "/api/v1/appointments/:appointment_id",
            get(appointment_handler::<D, R>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/cancel",
            post(cancel_handler::<D, R>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/complete",
            post(complete_handler::<D, R>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/email-logs",
            get(appointment_email_logs_handler::<D, R>),
        )
        .route("/api/v1/email-logs", get(email_logs_handler::<D, R>))
        .route(
            "/api/v1/vehicles/:vehicle_id/appointments",
            get(vehicle_appointments_handler::<D, R>),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id/inspectors",
            get(compatible_inspectors_handler::<D, R>),
        )
        .route(
            "/api/v1/inspectors/:inspector_id/appointments",
            get(inspector_appointments_handler::<D, R>),
        )
        .route(
            "/api/v1/customers/:customer_id/appointments",
            get(customer_appointments_handler::<D, R>),
        )
        .with_state(service)
}

/// HTTP status for a scheduling failure.
pub fn status_for(err: &SchedulingError) -> StatusCode {
    match err {
        SchedulingError::NotFound { .. } => StatusCode::NOT_FOUND,
        SchedulingError::CapabilityMismatch { .. } | SchedulingError::InvalidTime { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SchedulingError::Conflict { .. } | SchedulingError::InvalidStateTransition { .. } => {
            StatusCode::CONFLICT
        }
        SchedulingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: SchedulingError) -> Response {
    let status = status_for(&err);
    if let SchedulingError::Internal(source) = &err {
        error!(error = %source, "scheduling store failure");
    }

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, SchedulingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn schedule_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Json(body): Json<ScheduleAppointmentBody>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::CREATED, service.book(body.into()))
}

pub(crate) async fn list_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.list())
}

pub(crate) async fn appointment_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(appointment_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.get(AppointmentId(appointment_id)))
}

pub(crate) async fn cancel_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(appointment_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.cancel(AppointmentId(appointment_id)))
}

pub(crate) async fn complete_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(appointment_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.complete(AppointmentId(appointment_id)))
}

pub(crate) async fn appointment_email_logs_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(appointment_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.email_history_for(AppointmentId(appointment_id)),
    )
}

pub(crate) async fn email_logs_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.email_history())
}

pub(crate) async fn vehicle_appointments_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(vehicle_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(StatusCode::OK, service.list_for_vehicle(VehicleId(vehicle_id)))
}

pub(crate) async fn compatible_inspectors_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(vehicle_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.compatible_inspectors(VehicleId(vehicle_id)),
    )
}

pub(crate) async fn inspector_appointments_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(inspector_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.list_for_inspector(InspectorId(inspector_id)),
    )
}

pub(crate) async fn customer_appointments_handler<D, R>(
    State(service): State<Arc<AppointmentService<D, R>>>,
    Path(customer_id): Path<u32>,
) -> Response
where
    D: FleetDirectory + 'static,
    R: AppointmentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.list_for_customer(CustomerId(customer_id)),
    )
}
