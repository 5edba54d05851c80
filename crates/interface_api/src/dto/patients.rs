//! Patient DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_patient::{Gender, NewVisit, Patient, PatientDetails, PatientStatus, PatientUpdate, Visit};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(max = 150))]
    pub age: u32,
    pub gender: Gender,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub blood_group: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl From<CreatePatientRequest> for PatientDetails {
    fn from(request: CreatePatientRequest) -> Self {
        PatientDetails {
            name: request.name,
            age: request.age,
            gender: request.gender,
            phone: request.phone,
            email: request.email,
            address: request.address,
            blood_group: request.blood_group,
            medical_history: request.medical_history,
            allergies: request.allergies,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(max = 150))]
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub medical_history: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub status: Option<PatientStatus>,
}

impl From<UpdatePatientRequest> for PatientUpdate {
    fn from(request: UpdatePatientRequest) -> Self {
        PatientUpdate {
            name: request.name,
            age: request.age,
            gender: request.gender,
            phone: request.phone,
            email: request.email,
            address: request.address,
            blood_group: request.blood_group,
            medical_history: request.medical_history,
            allergies: request.allergies,
            status: request.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    /// Defaults to the time the visit is recorded
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub doctor: String,
}

impl From<RecordVisitRequest> for NewVisit {
    fn from(request: RecordVisitRequest) -> Self {
        NewVisit {
            date: request.date,
            diagnosis: request.diagnosis,
            prescription: request.prescription,
            notes: request.notes,
            doctor: request.doctor,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientListParams {
    pub search: Option<String>,
    pub status: Option<PatientStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub patient_id: String,
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

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        PatientResponse {
            id: *patient.id.as_uuid(),
            patient_id: patient.code,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            blood_group: patient.blood_group,
            medical_history: patient.medical_history,
            allergies: patient.allergies,
            status: patient.status,
            last_visit: patient.last_visit,
            visits: patient.visits,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_reads_camel_case() {
        let request: CreatePatientRequest = serde_json::from_value(json!({
            "name": "Asha Rao",
            "age": 34,
            "gender": "female",
            "phone": "9876543210",
            "bloodGroup": "O+",
            "medicalHistory": ["asthma"]
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.blood_group.as_deref(), Some("O+"));
        assert_eq!(request.medical_history, vec!["asthma".to_string()]);
        assert!(request.allergies.is_empty());
    }

    #[test]
    fn test_bad_email_fails_validation() {
        let request = UpdatePatientRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
