use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::booking::{BookingDraft, BookingInput, BookingPatch, Numeric};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern"));

const MIN_NAME_LEN: usize = 3;

/// Field name → human readable message. Ordered so responses are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn check_name(name: &str, errors: &mut ValidationErrors) {
    if name.chars().count() < MIN_NAME_LEN {
        errors.add("name", "Name must be at least 3 characters");
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if !EMAIL_RE.is_match(email) {
        errors.add("email", "Invalid email format");
    }
}

/// Accepts `YYYY-MM-DD`, or a full RFC 3339 timestamp whose date part is used.
pub fn parse_travel_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Validates a raw booking submission against the intake rules.
///
/// `today` is the submission date; travel dates before it are rejected.
/// Never panics on well-typed input: every defect is reported per field.
pub fn validate_booking(input: &BookingInput, today: NaiveDate) -> Result<BookingDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = trimmed(&input.name);
    match name {
        Some(n) => check_name(n, &mut errors),
        None => errors.add("name", "Name must be at least 3 characters"),
    }

    let email = trimmed(&input.email);
    match email {
        Some(e) => check_email(e, &mut errors),
        None => errors.add("email", "Email is required"),
    }

    let phone = trimmed(&input.phone);
    if let Some(p) = phone {
        if !PHONE_RE.is_match(p) {
            errors.add("phone", "Phone must be 10 digits");
        }
    }

    let location = trimmed(&input.location);
    if location.is_none() {
        errors.add("location", "City is required");
    }

    let place_name = trimmed(&input.place_name);
    if place_name.is_none() {
        errors.add("place_name", "Destination is required");
    }

    let travel_date = match trimmed(&input.travel_date) {
        None => {
            errors.add("travel_date", "Travel date is required");
            None
        }
        Some(raw) => match parse_travel_date(raw) {
            None => {
                errors.add("travel_date", "Travel date is not a valid date");
                None
            }
            Some(d) if d < today => {
                errors.add("travel_date", "Past dates are not allowed");
                None
            }
            Some(d) => Some(d),
        },
    };

    let people = input
        .people
        .as_ref()
        .and_then(Numeric::as_i64)
        .filter(|p| *p >= 1)
        .and_then(|p| i32::try_from(p).ok());
    if people.is_none() {
        errors.add("people", "At least 1 person required");
    }

    let price = match input.price.as_ref() {
        None => {
            errors.add("price", "Price is required");
            None
        }
        Some(raw) => match raw.as_f64() {
            Some(p) if p >= 0.0 => Some(p),
            _ => {
                errors.add("price", "Price must be a non-negative number");
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    match (name, email, location, place_name, travel_date, people, price) {
        (Some(name), Some(email), Some(location), Some(place_name), Some(travel_date), Some(people), Some(price)) => {
            Ok(BookingDraft {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.map(str::to_string),
                location: location.to_string(),
                travel_date,
                people,
                place_name: place_name.to_string(),
                price,
            })
        }
        // Every `None` above recorded an error, so this arm is unreachable in practice.
        _ => Err(errors),
    }
}

/// Validates and normalizes an admin edit. Only supplied fields are checked.
pub fn validate_patch(patch: &BookingPatch) -> Result<BookingPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if patch.is_empty() {
        errors.add("patch", "No fields to update");
        return Err(errors);
    }

    let name = patch.name.as_deref().map(str::trim);
    if let Some(n) = name {
        check_name(n, &mut errors);
    }
    let email = patch.email.as_deref().map(str::trim);
    if let Some(e) = email {
        check_email(e, &mut errors);
    }
    if let Some(p) = patch.people {
        if p < 1 {
            errors.add("people", "At least 1 person required");
        }
    }
    if let Some(p) = patch.price {
        if !p.is_finite() || p < 0.0 {
            errors.add("price", "Price must be a non-negative number");
        }
    }

    errors.into_result(BookingPatch {
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        people: patch.people,
        price: patch.price,
    })
}

/// Login credentials must both be present; the password format is not inspected.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result(())
}
