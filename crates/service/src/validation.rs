//! Per-table field checks and input sanitisation applied before records
//! reach the store. The store itself enforces no schema.

use serde_json::{Number, Value};

use crate::errors::ServiceError;
use crate::storage::record::{Record, Table, CREATED_AT, ID, UPDATED_AT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Every required field must be present.
    Create,
    /// Only the fields supplied are checked.
    Patch,
}

pub fn required_fields(table: Table) -> &'static [&'static str] {
    match table {
        Table::Products | Table::Services => &["name", "price"],
        Table::Bookings => &["name", "phone", "service", "date"],
        Table::Gallery => &["image_url"],
        Table::Videos => &["title", "video_url"],
        Table::Profiles => &["name"],
        Table::Admins => &["username", "password_hash"],
    }
}

/// Trim and escape client strings, and drop system-managed fields.
pub fn sanitize_record(input: Record) -> Record {
    input
        .into_iter()
        .filter(|(k, _)| k != ID && k != CREATED_AT && k != UPDATED_AT)
        .map(|(k, v)| (k, sanitize_value(v)))
        .collect()
}

fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_markup(s.trim())),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize_value(v))).collect()),
        other => other,
    }
}

/// Neutralise angle brackets so stored text cannot inject markup.
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Check `record` against the table's rules, coercing numeric strings in `price`.
pub fn validate(table: Table, record: &mut Record, mode: Mode) -> Result<(), ServiceError> {
    if !table.is_admin_managed() {
        return Err(ServiceError::Validation(format!("{table} cannot be modified here")));
    }

    for field in required_fields(table) {
        match record.get(*field) {
            Some(v) if is_blank(v) => {
                return Err(ServiceError::Validation(format!("{field} must not be empty")));
            }
            None if mode == Mode::Create => {
                return Err(ServiceError::Validation(format!("{field} is required")));
            }
            _ => {}
        }
    }

    if let Some(price) = record.get_mut("price") {
        *price = Value::Number(parse_price(price)?);
    }
    if let Some(phone) = record.get("phone") {
        validate_phone(phone)?;
    }
    Ok(())
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_price(v: &Value) -> Result<Number, ServiceError> {
    let invalid = || ServiceError::Validation("price must be a non-negative number".into());
    let n = match v {
        Value::Number(n) => n.clone(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | ' ' | '_')).collect();
            if let Ok(i) = cleaned.parse::<u64>() {
                Number::from(i)
            } else {
                let f = cleaned.parse::<f64>().map_err(|_| invalid())?;
                Number::from_f64(f).ok_or_else(invalid)?
            }
        }
        _ => return Err(invalid()),
    };
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.is_finite() => Ok(n),
        _ => Err(invalid()),
    }
}

fn validate_phone(v: &Value) -> Result<(), ServiceError> {
    let Value::String(s) = v else {
        return Err(ServiceError::Validation("phone must be a string".into()));
    };
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    let only_phone_chars = s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !only_phone_chars || !(7..=15).contains(&digits) {
        return Err(ServiceError::Validation("phone must contain 7 to 15 digits".into()));
    }
    Ok(())
}
