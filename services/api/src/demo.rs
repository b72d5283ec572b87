use crate::infra::{InspectionCenter, RosterSource};
use chrono::{Duration, Local, NaiveDateTime};
use clap::Args;
use inspection_scheduler::config::AppConfig;
use inspection_scheduler::error::AppError;
use inspection_scheduler::scheduling::router::parse_timestamp;
use inspection_scheduler::scheduling::{
    Appointment, AppointmentId, AppointmentRequest, BookingReceipt, EmailLog, FleetDirectory,
    InspectorId, SchedulingError, VehicleId,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory holding customers.csv, vehicles.csv and inspectors.csv.
    /// The bundled sample roster is used when omitted.
    #[arg(long)]
    pub(crate) roster_dir: Option<PathBuf>,
    /// Slot used for the demo bookings (YYYY-MM-DD HH:MM). Defaults to tomorrow at 08:00.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<NaiveDateTime>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { roster_dir, at } = args;

    let config = AppConfig::load()?;
    let center = InspectionCenter::with_outbox(&config.mail);
    let source = match roster_dir.as_deref() {
        Some(dir) => RosterSource::Directory(dir),
        None => RosterSource::Sample,
    };
    let roster = center.load_roster(source)?;

    let now = Local::now().naive_local();
    let slot = at.unwrap_or_else(|| next_morning(now));

    println!("Inspection scheduling demo");
    println!(
        "Roster: {} customers | {} vehicles | {} inspectors",
        roster.customers, roster.vehicles, roster.inspectors
    );
    if !center.scheduler.notifier().is_configured() {
        println!("Mail credentials not configured; confirmations will be logged as unsent");
    }
    println!("Booking slot: {}", slot.format("%Y-%m-%d %H:%M"));

    for line in walkthrough(&center, now, slot)? {
        println!("{line}");
    }

    println!("\nConfirmation log");
    for log in center.scheduler.email_history()? {
        println!("{}", describe_log(&log));
    }
    println!(
        "\n{} confirmation(s) delivered to the outbox",
        center.outbox.delivered().len()
    );
    Ok(())
}

fn next_morning(now: NaiveDateTime) -> NaiveDateTime {
    (now.date() + Duration::days(1))
        .and_hms_opt(8, 0, 0)
        .unwrap_or_else(|| now + Duration::days(1))
}

/// Scripted booking day: two accepted bookings, each rejection kind, the
/// status lifecycle and a rebooking of a released slot.
pub(crate) fn walkthrough(
    center: &InspectionCenter,
    now: NaiveDateTime,
    slot: NaiveDateTime,
) -> Result<Vec<String>, AppError> {
    let scheduler = &center.scheduler;
    let book = |vehicle: u32, inspector: u32, at: NaiveDateTime| {
        scheduler.book_at(
            AppointmentRequest {
                vehicle_id: VehicleId(vehicle),
                inspector_id: InspectorId(inspector),
                scheduled_for: at,
            },
            now,
        )
    };

    let mut lines = vec!["\nBookings".to_string()];

    let car = book(1, 1, slot);
    let car_id = car.as_ref().ok().map(|receipt| receipt.appointment.id);
    lines.push(booking_line(center, "Light car with light inspector", car)?);

    let truck = book(3, 2, slot);
    let truck_id = truck.as_ref().ok().map(|receipt| receipt.appointment.id);
    lines.push(booking_line(
        center,
        "Heavy truck with heavy inspector, same slot",
        truck,
    )?);

    lines.push(booking_line(
        center,
        "Motorcycle with light inspector",
        book(2, 1, slot),
    )?);
    lines.push(booking_line(
        center,
        "Second car with the busy light inspector",
        book(4, 1, slot),
    )?);
    lines.push(booking_line(
        center,
        "Same car again with another light inspector",
        book(1, 4, slot),
    )?);
    lines.push(booking_line(
        center,
        "Second car at the current time",
        book(4, 4, now),
    )?);

    lines.push("\nStatus changes".to_string());
    if let Some(id) = car_id {
        lines.push(status_line("Complete", id, scheduler.complete(id))?);
        lines.push(status_line("Cancel", id, scheduler.cancel(id))?);
    }
    if let Some(id) = truck_id {
        lines.push(status_line("Cancel", id, scheduler.cancel(id))?);
    }
    lines.push(booking_line(
        center,
        "Second car with the light inspector, slot released",
        book(4, 1, slot),
    )?);

    Ok(lines)
}

fn booking_line(
    center: &InspectionCenter,
    label: &str,
    outcome: Result<BookingReceipt, SchedulingError>,
) -> Result<String, AppError> {
    match outcome {
        Ok(receipt) => {
            let appointment = &receipt.appointment;
            let plate = center
                .fleet
                .vehicle(appointment.vehicle_id)
                .map_err(SchedulingError::from)?
                .map(|vehicle| vehicle.license_plate)
                .unwrap_or_default();
            let inspector = center
                .fleet
                .inspector(appointment.inspector_id)
                .map_err(SchedulingError::from)?
                .map(|inspector| inspector.name)
                .unwrap_or_default();
            Ok(format!(
                "- {label}: booked #{:04} {plate} with {inspector} ({})",
                appointment.id.0,
                confirmation_label(&receipt.email_log)
            ))
        }
        Err(err) if err.is_domain() => Ok(format!("- {label}: rejected, {err}")),
        Err(err) => Err(err.into()),
    }
}

fn status_line(
    action: &str,
    id: AppointmentId,
    outcome: Result<Appointment, SchedulingError>,
) -> Result<String, AppError> {
    match outcome {
        Ok(appointment) => Ok(format!(
            "- {action} #{:04}: now {}",
            id.0, appointment.status
        )),
        Err(err) if err.is_domain() => Ok(format!("- {action} #{:04}: rejected, {err}", id.0)),
        Err(err) => Err(err.into()),
    }
}

fn confirmation_label(log: &EmailLog) -> String {
    match log.error_message.as_deref() {
        None => format!("confirmation sent to {}", log.recipient),
        Some(reason) => format!("confirmation not sent: {reason}"),
    }
}

fn describe_log(log: &EmailLog) -> String {
    format!(
        "- #{:04} {} | {} | {}",
        log.appointment_id.0,
        log.status_label(),
        log.recipient,
        log.error_message.as_deref().unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mail_without_credentials;
    use chrono::NaiveDate;

    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 3)
            .expect("valid date")
            .and_hms_opt(9, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn next_morning_is_eight_the_following_day() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 4)
            .expect("valid date")
            .and_hms_opt(8, 0, 0)
            .expect("valid time");
        assert_eq!(next_morning(monday_morning()), expected);
    }

    #[test]
    fn walkthrough_covers_every_outcome() {
        let center = InspectionCenter::with_outbox(&mail_without_credentials());
        center
            .load_roster(RosterSource::Sample)
            .expect("sample roster imports");
        let now = monday_morning();

        let lines = walkthrough(&center, now, next_morning(now)).expect("walkthrough runs");

        assert!(lines[1].contains("booked #0001 ABC123 with Carlos Ruiz"));
        assert!(lines[1].contains("confirmation not sent: Credentials not configured"));
        assert!(lines[2].contains("booked #0002 KLM456 with Marta Diaz"));
        assert!(lines[3].contains("rejected, inspector 1 is certified for"));
        assert!(lines[4].contains("rejected, inspector already has an appointment"));
        assert!(lines[5].contains("rejected, vehicle already has an appointment"));
        assert!(lines[6].contains("rejected, appointment time"));
        assert_eq!(lines[8], "- Complete #0001: now completed");
        assert!(lines[9].contains("rejected, cannot cancel an appointment with status completed"));
        assert_eq!(lines[10], "- Cancel #0002: now cancelled");
        assert!(lines[11].contains("booked #0003 DEF789 with Carlos Ruiz"));

        let logs = center.scheduler.email_history().expect("logs");
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|log| !log.was_sent));
        assert!(center.outbox.delivered().is_empty());
    }
}
