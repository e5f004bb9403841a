//! Table names, schema-less records and the canonical id form.
//!
//! Records are plain JSON objects. Only `id`, `created_at` and `updated_at`
//! are managed here; every other field belongs to the caller.

use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// A single table entry.
pub type Record = Map<String, Value>;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// The fixed set of tables, each persisted as `<name>.json`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Admins,
    Products,
    Services,
    Bookings,
    Gallery,
    Videos,
    Profiles,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Admins,
        Table::Products,
        Table::Services,
        Table::Bookings,
        Table::Gallery,
        Table::Videos,
        Table::Profiles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Admins => "admins",
            Table::Products => "products",
            Table::Services => "services",
            Table::Bookings => "bookings",
            Table::Gallery => "gallery",
            Table::Videos => "videos",
            Table::Profiles => "profiles",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Tables anyone may list without a token.
    pub fn is_public(self) -> bool {
        !matches!(self, Table::Admins | Table::Bookings)
    }

    /// Admin credentials are only reachable through the auth service.
    pub fn is_admin_managed(self) -> bool {
        !matches!(self, Table::Admins)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ServiceError::Validation(format!("unknown table '{s}'")))
    }
}

/// Canonical record id.
///
/// Integers and integer-looking strings both become `Int`, so `5` and `"5"`
/// compare equal. Anything else stays `Text` and compares verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(raw.to_string()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(RecordId::Int(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                        Some(RecordId::Int(f as i64))
                    }
                    _ => Some(RecordId::Text(n.to_string())),
                }
            }
            Value::String(s) => Some(RecordId::parse(s)),
            _ => None,
        }
    }

    /// Id of a stored record, if it carries one.
    pub fn of(record: &Record) -> Option<Self> {
        record.get(ID).and_then(RecordId::from_value)
    }

    pub fn matches(&self, record: &Record) -> bool {
        RecordId::of(record).as_ref() == Some(self)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self { RecordId::Int(n) }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self { RecordId::parse(s) }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordId::Int(n) => serializer.serialize_i64(*n),
            RecordId::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Copy of `input` with a clock-derived `id` and `created_at`.
///
/// Any caller-supplied `id` is overwritten. Two calls within the same
/// millisecond produce the same id; collisions are not detected.
pub fn enrich_new(input: &Record, now: DateTime<Utc>) -> Record {
    let mut record = input.clone();
    record.insert(ID.into(), Value::from(now.timestamp_millis()));
    record.insert(CREATED_AT.into(), Value::String(timestamp(now)));
    record
}

/// Index of the first record whose id loosely equals `id`.
pub fn position_of(records: &[Record], id: &RecordId) -> Option<usize> {
    records.iter().position(|r| id.matches(r))
}

/// Shallow merge of `partial` into `existing`, stamping `updated_at`.
/// `id` and `created_at` in the partial are ignored.
pub fn merge_update(existing: &mut Record, partial: Record, now: DateTime<Utc>) {
    for (key, value) in partial {
        if key == ID || key == CREATED_AT {
            continue;
        }
        existing.insert(key, value);
    }
    existing.insert(UPDATED_AT.into(), Value::String(timestamp(now)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn numeric_and_string_ids_compare_equal() {
        assert_eq!(RecordId::from(42), RecordId::from("42"));
        assert_eq!(RecordId::from_value(&json!(42)), Some(RecordId::Int(42)));
        assert_eq!(RecordId::from_value(&json!("42")), Some(RecordId::Int(42)));
        assert_eq!(RecordId::from_value(&json!(42.0)), Some(RecordId::Int(42)));
        assert_ne!(RecordId::from("abc"), RecordId::from("42"));
        assert_eq!(RecordId::from_value(&json!(null)), None);
    }

    #[test]
    fn text_ids_match_verbatim() {
        let r = record(json!({"id": "gallery-1"}));
        assert!(RecordId::from("gallery-1").matches(&r));
        assert!(!RecordId::from("gallery-2").matches(&r));
    }

    #[test]
    fn table_names_round_trip_through_from_str() {
        for t in Table::ALL {
            assert_eq!(t.as_str().parse::<Table>().unwrap(), t);
        }
        assert!(matches!("orders".parse::<Table>(), Err(ServiceError::Validation(_))));
        assert_eq!(Table::Gallery.file_name(), "gallery.json");
    }

    #[test]
    fn enrich_new_overwrites_id_and_leaves_input_alone() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let input = record(json!({"id": 7, "name": "Facial"}));
        let out = enrich_new(&input, now);

        assert_eq!(out["id"], json!(now.timestamp_millis()));
        assert_eq!(out["created_at"], json!("2024-03-01T10:00:00.000Z"));
        assert_eq!(out["name"], json!("Facial"));
        assert_eq!(input["id"], json!(7));
        assert!(!input.contains_key("created_at"));
    }

    #[test]
    fn merge_update_keeps_unspecified_fields() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
        let mut existing = record(json!({"id": 1, "name": "A", "price": 10, "created_at": "x"}));
        merge_update(&mut existing, record(json!({"price": 20, "id": 99, "created_at": "y"})), now);

        assert_eq!(existing["id"], json!(1));
        assert_eq!(existing["name"], json!("A"));
        assert_eq!(existing["price"], json!(20));
        assert_eq!(existing["created_at"], json!("x"));
        assert_eq!(existing["updated_at"], json!("2024-03-02T08:30:00.000Z"));
    }

    #[test]
    fn position_of_returns_first_duplicate() {
        let records = vec![
            record(json!({"id": 5, "n": "first"})),
            record(json!({"id": "5", "n": "second"})),
        ];
        assert_eq!(position_of(&records, &RecordId::from(5)), Some(0));
        assert_eq!(position_of(&records, &RecordId::from(6)), None);
    }
}
