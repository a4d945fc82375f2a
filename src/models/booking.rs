use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A stored appointment request.
///
/// Serialized with the keys the web client reads: `_id` for the identity and
/// camelCase for `createdAt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Strict parse: unlike request payloads, a stored value is never defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| FieldError::invalid_status(s))
    }
}

/// One rejected field of a booking payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{field} is required"),
        }
    }

    fn invalid_status(value: &str) -> Self {
        Self {
            field: "status",
            message: format!(
                "`{value}` is not a valid status (expected one of: pending, completed, cancelled)"
            ),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every field error found in a payload, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "booking validation failed: {joined}")
    }
}

impl std::error::Error for ValidationError {}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// Booking submission as received from a client. Every field is optional here
/// so that missing fields are reported by [`NewBooking::validate`] rather than
/// by the body parser. Unknown keys (including `_id` and `createdAt`) are dropped.
/// Numbers and booleans are accepted for text fields and kept as their JSON text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBooking {
    #[serde(default, deserialize_with = "scalar_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub status: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a text value, found {other}"
        ))),
    }
}

/// A payload that passed validation, normalized and defaulted, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub notes: String,
    pub status: BookingStatus,
}

impl NewBooking {
    pub fn validate(&self) -> Result<ValidatedBooking, ValidationError> {
        let mut errors = Vec::new();

        let mut required = |field: &'static str, value: &Option<String>| -> String {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    errors.push(FieldError::required(field));
                    String::new()
                }
            }
        };

        let name = required("name", &self.name);
        let email = required("email", &self.email).to_lowercase();
        let phone = required("phone", &self.phone);
        let service = required("service", &self.service);
        // date and time are checked for presence but kept as submitted
        let _ = required("date", &self.date);
        let _ = required("time", &self.time);

        let status = match self.status.as_deref() {
            None => BookingStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                errors.push(e);
                BookingStatus::default()
            }),
        };

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        Ok(ValidatedBooking {
            name,
            email,
            phone,
            service,
            date: self.date.clone().unwrap_or_default(),
            time: self.time.clone().unwrap_or_default(),
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status,
        })
    }
}

/// Parses a requested status for a status update; absence is an error here.
pub fn parse_status(raw: Option<&str>) -> Result<BookingStatus, ValidationError> {
    match raw {
        Some(value) => value.parse().map_err(ValidationError::from),
        None => Err(FieldError::required("status").into()),
    }
}
