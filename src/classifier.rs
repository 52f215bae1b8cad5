//! Classification of raw tracking events.
//!
//! Turns an `evento` record as sent by the service into a [`TrackingEvent`],
//! attaching a human-readable `details` note for the event codes that carry
//! one.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::TrackingError;
use crate::types::TrackingEvent;

/// Only accepted timestamp shape: `dd/MM/yyyy HH:mm`
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

const NEXT_BUSINESS_DAY: &str = "Object subject to forwarding on the next business day.";

/// Event record as it appears in the XML response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "tipo")]
    pub event_type: String,
    pub status: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora")]
    pub hour: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "local", default)]
    pub location: String,
    #[serde(rename = "codigo", default)]
    pub location_code: String,
    #[serde(rename = "cidade", default)]
    pub city: String,
    #[serde(rename = "uf", default)]
    pub state: String,
    #[serde(rename = "destino", default)]
    pub destination: Option<RawDestination>,
}

/// Where an object is being forwarded to
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDestination {
    #[serde(rename = "cidade", default)]
    pub city: Option<String>,
    #[serde(rename = "uf", default)]
    pub state: Option<String>,
    #[serde(rename = "bairro", default)]
    pub neighborhood: Option<String>,
    #[serde(rename = "local", default)]
    pub location: Option<String>,
}

/// Classify one raw event
pub fn classify(raw: RawEvent) -> Result<TrackingEvent, TrackingError> {
    let event_type = raw.event_type.trim().to_uppercase();
    let status: i32 = raw.status.trim().parse().map_err(|_| {
        TrackingError::parse(format!(
            "invalid status '{}' for event {}",
            raw.status, event_type
        ))
    })?;
    let timestamp = parse_timestamp(&raw.date, &raw.hour)?;
    let details = derive_details(&event_type, status, raw.destination.as_ref());

    Ok(TrackingEvent {
        event_type,
        status,
        timestamp,
        description: raw.description,
        details,
        location: raw.location,
        location_code: raw.location_code,
        city: raw.city,
        state: raw.state,
    })
}

fn parse_timestamp(date: &str, hour: &str) -> Result<NaiveDateTime, TrackingError> {
    let (date, hour) = (date.trim(), hour.trim());
    let raw = format!("{} {}", date, hour);

    // chrono tolerates unpadded fields and short years; the service never sends those.
    if !matches_shape(date, "DD/DD/DDDD") || !matches_shape(hour, "DD:DD") {
        return Err(TrackingError::parse(format!(
            "invalid event timestamp '{}': expected dd/MM/yyyy HH:mm",
            raw
        )));
    }

    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| TrackingError::parse(format!("invalid event timestamp '{}': {}", raw, e)))
}

/// `D` in `pattern` stands for an ASCII digit, anything else must match literally
fn matches_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value.bytes().zip(pattern.bytes()).all(|(v, p)| match p {
            b'D' => v.is_ascii_digit(),
            _ => v == p,
        })
}

/// Details note for an event code, first matching rule wins
pub fn derive_details(
    event_type: &str,
    status: i32,
    destination: Option<&RawDestination>,
) -> Option<String> {
    match (event_type, status) {
        ("PO", 9) => Some(NEXT_BUSINESS_DAY.to_string()),
        ("DO", 0..=2) | ("PMT", 1) | ("TRI", 1) | ("RO", 0 | 1) => {
            destination.and_then(forwarding_note)
        }
        _ => None,
    }
}

fn forwarding_note(destination: &RawDestination) -> Option<String> {
    // No city or state means nothing useful to say.
    let city = non_empty(&destination.city)?;
    let state = non_empty(&destination.state)?;

    let mut note = format!("Object forwarded to {}/{}", city, state);
    if let Some(neighborhood) = non_empty(&destination.neighborhood) {
        note.push_str(" - Neighborhood: ");
        note.push_str(neighborhood);
    }
    if let Some(location) = non_empty(&destination.location) {
        note.push_str(" - Location: ");
        note.push_str(location);
    }
    Some(note)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
