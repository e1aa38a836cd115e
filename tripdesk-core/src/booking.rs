use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A persisted trip reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub travel_date: NaiveDate,
    pub people: i32,
    pub place_name: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Applies exactly the fields present in `patch`, leaving every other field untouched.
    pub fn apply_patch(&mut self, patch: &BookingPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(people) = patch.people {
            self.people = people;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

/// A number that may arrive either as a JSON number or as a numeric string
/// (HTML form inputs post `"2"` rather than `2`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Int(v) => Some(*v as f64),
            Numeric::Float(v) if v.is_finite() => Some(*v),
            Numeric::Float(_) => None,
            Numeric::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(v) => Some(*v),
            Numeric::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Numeric::Float(_) => None,
            Numeric::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

/// Raw booking submission as received from a traveler.
///
/// Every field is optional so that a structurally valid but incomplete
/// payload reaches the validator instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "date")]
    pub travel_date: Option<String>,
    #[serde(default)]
    pub people: Option<Numeric>,
    #[serde(default, alias = "placeName")]
    pub place_name: Option<String>,
    #[serde(default)]
    pub price: Option<Numeric>,
}

/// A validated, normalized booking ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub travel_date: NaiveDate,
    pub people: i32,
    pub place_name: String,
    pub price: f64,
}

/// Admin-editable subset of a booking. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.people.is_none() && self.price.is_none()
    }
}

/// The pre-provisioned administrator. `password_hash` is a PHC string.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}
