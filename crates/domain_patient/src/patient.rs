//! Patient aggregate and visit history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PatientId, SequentialCode};
use crate::error::PatientError;

const MAX_NAME_LEN: usize = 100;
const MAX_AGE: u32 = 150;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Whether the patient is currently under care
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
}

/// A single consultation entry in a patient's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub date: DateTime<Utc>,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub doctor: String,
}

/// Input for recording a visit
#[derive(Debug, Clone)]
pub struct NewVisit {
    /// Defaults to the time the visit is recorded
    pub date: Option<DateTime<Utc>>,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub doctor: String,
}

impl Visit {
    /// Validates a visit request, dating it `now` unless a date was given
    pub fn from_new(visit: NewVisit, now: DateTime<Utc>) -> Result<Self, PatientError> {
        if visit.diagnosis.trim().is_empty() {
            return Err(PatientError::validation("diagnosis is required"));
        }
        if visit.doctor.trim().is_empty() {
            return Err(PatientError::validation("doctor is required"));
        }
        Ok(Self {
            date: visit.date.unwrap_or(now),
            diagnosis: visit.diagnosis,
            prescription: visit.prescription,
            notes: visit.notes,
            doctor: visit.doctor,
        })
    }
}

impl NewVisit {
    pub fn new(diagnosis: impl Into<String>, doctor: impl Into<String>) -> Self {
        Self {
            date: None,
            diagnosis: diagnosis.into(),
            prescription: None,
            notes: None,
            doctor: doctor.into(),
        }
    }
}

/// Caller-supplied patient fields
#[derive(Debug, Clone)]
pub struct PatientDetails {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub medical_history: Vec<String>,
    pub allergies: Vec<String>,
}

impl PatientDetails {
    pub fn new(name: impl Into<String>, age: u32, gender: Gender, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            gender,
            phone: phone.into(),
            email: None,
            address: None,
            blood_group: None,
            medical_history: Vec::new(),
            allergies: Vec::new(),
        }
    }
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub medical_history: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub status: Option<PatientStatus>,
}

/// A patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    /// Sequential `DOC` code, assigned once
    pub code: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub medical_history: Vec<String>,
    pub allergies: Vec<String>,
    pub status: PatientStatus,
    pub last_visit: Option<DateTime<Utc>>,
    pub visits: Vec<Visit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Builds a validated, active patient under `code`
    pub fn new(
        code: SequentialCode,
        details: PatientDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, PatientError> {
        validate_name(&details.name)?;
        validate_age(details.age)?;
        validate_phone(&details.phone)?;
        if let Some(email) = &details.email {
            validate_email(email)?;
        }

        Ok(Self {
            id: PatientId::new_v7(),
            code: code.to_string(),
            name: details.name.trim().to_string(),
            age: details.age,
            gender: details.gender,
            phone: details.phone.trim().to_string(),
            email: details.email,
            address: details.address,
            blood_group: details.blood_group,
            medical_history: details.medical_history,
            allergies: details.allergies,
            status: PatientStatus::Active,
            last_visit: None,
            visits: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update; nothing changes if any field is invalid
    pub fn apply_update(&mut self, update: PatientUpdate, now: DateTime<Utc>) -> Result<(), PatientError> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(age) = update.age {
            validate_age(age)?;
        }
        if let Some(phone) = &update.phone {
            validate_phone(phone)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if update.blood_group.is_some() {
            self.blood_group = update.blood_group;
        }
        if let Some(history) = update.medical_history {
            self.medical_history = history;
        }
        if let Some(allergies) = update.allergies {
            self.allergies = allergies;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Appends a visit, moves `last_visit` forward and reactivates the patient
    pub fn record_visit(&mut self, visit: NewVisit, now: DateTime<Utc>) -> Result<&Visit, PatientError> {
        let visit = Visit::from_new(visit, now)?;
        self.push_visit(visit, now);
        self.visits
            .last()
            .ok_or_else(|| PatientError::validation("visit was not recorded"))
    }

    /// Appends an already validated visit
    pub fn push_visit(&mut self, visit: Visit, now: DateTime<Utc>) {
        self.touch_last_visit(visit.date);
        self.visits.push(visit);
        self.status = PatientStatus::Active;
        self.updated_at = now;
    }

    /// Records that the patient was seen at `at`; never moves backwards
    pub fn touch_last_visit(&mut self, at: DateTime<Utc>) {
        if self.last_visit.map_or(true, |current| at > current) {
            self.last_visit = Some(at);
        }
    }

    /// Case-insensitive match on name, phone or code
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.phone.contains(term)
            || self.code.to_lowercase().contains(&needle)
    }
}

fn validate_name(name: &str) -> Result<(), PatientError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PatientError::validation("name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(PatientError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_age(age: u32) -> Result<(), PatientError> {
    if age > MAX_AGE {
        return Err(PatientError::validation(format!("age must be between 0 and {MAX_AGE}")));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), PatientError> {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(PatientError::validation("phone may only contain digits, spaces and dashes"));
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(PatientError::validation(format!(
            "phone must have {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), PatientError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(PatientError::validation("email is not a valid address")),
    }
}
