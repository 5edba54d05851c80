//! Request handlers
//!
//! Path `:id` segments accept either the sequential code (`DOC001`,
//! `MED002`, `SER003`, `BILL004`) or the record's UUID.

pub mod health;
pub mod auth;
pub mod patients;
pub mod medicines;
pub mod services;
pub mod bills;
pub mod dashboard;
pub mod identifiers;

use core_kernel::{BillId, MedicineId, PatientId, SequenceKind, SequentialCode, ServiceId};

use crate::error::ApiError;
use crate::AppState;

/// How a path or body refers to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey<Id> {
    Id(Id),
    Code(String),
}

/// Splits a raw key into a UUID or a code of the given kind
pub fn parse_key<Id: std::str::FromStr>(kind: SequenceKind, raw: &str) -> Result<RecordKey<Id>, ApiError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<Id>() {
        return Ok(RecordKey::Id(id));
    }
    SequentialCode::parse_as(kind, raw)
        .map(|_| RecordKey::Code(raw.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("'{raw}' is not a {kind} code or id")))
}

pub(crate) async fn resolve_patient(state: &AppState, raw: &str) -> Result<PatientId, ApiError> {
    match parse_key(SequenceKind::Patient, raw)? {
        RecordKey::Id(id) => Ok(id),
        RecordKey::Code(code) => Ok(state.patients.get_patient_by_code(&code).await?.id),
    }
}

pub(crate) async fn resolve_medicine(state: &AppState, raw: &str) -> Result<MedicineId, ApiError> {
    match parse_key(SequenceKind::Medicine, raw)? {
        RecordKey::Id(id) => Ok(id),
        RecordKey::Code(code) => Ok(state.inventory.get_medicine_by_code(&code).await?.id),
    }
}

pub(crate) async fn resolve_service(state: &AppState, raw: &str) -> Result<ServiceId, ApiError> {
    match parse_key(SequenceKind::Service, raw)? {
        RecordKey::Id(id) => Ok(id),
        RecordKey::Code(code) => Ok(state.catalog.get_service_by_code(&code).await?.id),
    }
}

pub(crate) async fn resolve_bill(state: &AppState, raw: &str) -> Result<BillId, ApiError> {
    match parse_key(SequenceKind::Bill, raw)? {
        RecordKey::Id(id) => Ok(id),
        RecordKey::Code(code) => Ok(state.ledger.get_invoice_by_code(&code).await?.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_parse_key_accepts_codes_and_uuids() {
        let uuid = Uuid::new_v4();
        assert_eq!(
            parse_key::<BillId>(SequenceKind::Bill, &uuid.to_string()).unwrap(),
            RecordKey::Id(BillId::from(uuid))
        );
        assert_eq!(
            parse_key::<BillId>(SequenceKind::Bill, "BILL1000").unwrap(),
            RecordKey::Code("BILL1000".to_string())
        );
    }

    #[test]
    fn test_parse_key_rejects_other_kinds() {
        assert!(parse_key::<BillId>(SequenceKind::Bill, "MED001").is_err());
        assert!(parse_key::<PatientId>(SequenceKind::Patient, "nonsense").is_err());
    }
}
