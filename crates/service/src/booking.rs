//! Booking form workflow: persist the request, then hand the customer a
//! WhatsApp deep link carrying the same details.

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::record::{Record, Table};
use crate::storage::store::RecordStore;
use crate::validation::{self, Mode};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookingConfirmation {
    pub booking: Record,
    pub whatsapp_url: String,
}

pub struct BookingService {
    store: Arc<dyn RecordStore>,
    whatsapp_number: String,
}

impl BookingService {
    pub fn new(store: Arc<dyn RecordStore>, whatsapp_number: impl Into<String>) -> Self {
        Self { store, whatsapp_number: whatsapp_number.into() }
    }

    #[instrument(skip(self, request), fields(service = %request.service, date = %request.date))]
    pub async fn submit(&self, request: BookingRequest) -> Result<BookingConfirmation, ServiceError> {
        let raw = match serde_json::to_value(&request).map_err(ServiceError::storage)? {
            Value::Object(map) => map,
            _ => return Err(ServiceError::Validation("booking must be an object".into())),
        };
        let mut record = validation::sanitize_record(raw);
        // Optional fields submitted blank by the form are dropped rather than stored empty.
        record.retain(|_, v| !matches!(v, Value::String(s) if s.is_empty()));
        validation::validate(Table::Bookings, &mut record, Mode::Create)?;
        record.insert("status".into(), Value::String("pending".into()));

        let booking = self.store.insert(Table::Bookings, &record).await?;
        let whatsapp_url = whatsapp_link(&self.whatsapp_number, &booking)?;
        info!(id = ?booking.get("id"), "booking stored");
        Ok(BookingConfirmation { booking, whatsapp_url })
    }
}

/// `https://wa.me/<number>?text=<message>`; an empty number lets the customer pick the chat.
pub fn whatsapp_link(number: &str, booking: &Record) -> Result<String, ServiceError> {
    let base = format!("https://wa.me/{number}");
    let url = Url::parse_with_params(&base, &[("text", booking_message(booking))])
        .map_err(|e| ServiceError::Validation(format!("invalid whatsapp number: {e}")))?;
    Ok(url.to_string())
}

fn booking_message(booking: &Record) -> String {
    let field = |key: &str| booking.get(key).and_then(Value::as_str).unwrap_or("");
    let mut lines = vec![
        "Hello, I would like to book an appointment.".to_string(),
        format!("Name: {}", field("name")),
        format!("Phone: {}", field("phone")),
        format!("Service: {}", field("service")),
        format!("Date: {}", field("date")),
    ];
    if !field("time").is_empty() {
        lines.push(format!("Time: {}", field("time")));
    }
    if !field("notes").is_empty() {
        lines.push(format!("Notes: {}", field("notes")));
    }
    if let Some(id) = booking.get("id") {
        lines.push(format!("Booking ref: {id}"));
    }
    lines.join("\n")
}
