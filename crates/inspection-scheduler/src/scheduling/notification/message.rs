use std::fmt::Write as _;

use crate::scheduling::domain::{Appointment, Customer, Inspector, Vehicle};

/// Fully rendered confirmation, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipient: String,
    pub recipient_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("recipient address missing")]
    MissingRecipient,
    #[error("recipient address '{0}' is malformed")]
    MalformedRecipient(String),
    #[error("unable to render message body")]
    Render(#[from] std::fmt::Error),
}

pub fn confirmation_subject(sender_name: &str) -> String {
    format!("Appointment confirmation - {sender_name}")
}

/// Renders the confirmation sent to a customer after booking.
pub fn compose_confirmation(
    sender_name: &str,
    appointment: &Appointment,
    customer: &Customer,
    vehicle: &Vehicle,
    inspector: &Inspector,
) -> Result<OutboundEmail, CompositionError> {
    let recipient = customer.email.trim();
    if recipient.is_empty() {
        return Err(CompositionError::MissingRecipient);
    }
    if !recipient.contains('@') {
        return Err(CompositionError::MalformedRecipient(recipient.to_string()));
    }

    let when = appointment.scheduled_for.format("%A, %B %d, %Y");
    let time = appointment.scheduled_for.format("%H:%M");
    let number = format!("#{:04}", appointment.id.0);

    let mut text = String::new();
    writeln!(text, "{sender_name}")?;
    writeln!(text)?;
    writeln!(text, "Dear {},", customer.name)?;
    writeln!(text)?;
    writeln!(text, "Your inspection appointment has been confirmed.")?;
    writeln!(text)?;
    writeln!(text, "Appointment: {number}")?;
    writeln!(text, "Date: {when}")?;
    writeln!(text, "Time: {time}")?;
    writeln!(text, "Status: {}", appointment.status)?;
    writeln!(text)?;
    writeln!(
        text,
        "Vehicle: {} {} {} ({}), plate {}",
        vehicle.brand,
        vehicle.model,
        vehicle.year,
        vehicle.category.label(),
        vehicle.license_plate
    )?;
    writeln!(
        text,
        "Inspector: {} ({}), {} / {}",
        inspector.name,
        inspector.certification.label(),
        inspector.phone,
        inspector.email
    )?;
    writeln!(text)?;
    writeln!(text, "Please arrive 10 minutes early and bring the vehicle documents.")?;

    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html><body>")?;
    writeln!(html, "<h1>{}</h1>", escape(sender_name))?;
    writeln!(html, "<p>Dear {},</p>", escape(&customer.name))?;
    writeln!(html, "<p>Your inspection appointment has been confirmed.</p>")?;
    writeln!(html, "<table>")?;
    for (label, value) in [
        ("Appointment", number.clone()),
        ("Date", when.to_string()),
        ("Time", time.to_string()),
        ("Status", appointment.status.to_string()),
        ("Plate", vehicle.license_plate.clone()),
        (
            "Vehicle",
            format!("{} {} {}", vehicle.brand, vehicle.model, vehicle.year),
        ),
        ("Inspector", inspector.name.clone()),
    ] {
        writeln!(
            html,
            "<tr><th>{label}</th><td>{}</td></tr>",
            escape(&value)
        )?;
    }
    writeln!(html, "</table>")?;
    writeln!(
        html,
        "<p>Please arrive 10 minutes early and bring the vehicle documents.</p>"
    )?;
    writeln!(html, "</body></html>")?;

    Ok(OutboundEmail {
        recipient: recipient.to_string(),
        recipient_name: customer.name.clone(),
        subject: confirmation_subject(sender_name),
        html_body: html,
        text_body: text,
    })
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
