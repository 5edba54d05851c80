//! Patient application service

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use core_kernel::{insert_with_code, PatientId, PortError, SequenceKind, SequencePort, SequentialCode};

use crate::error::PatientError;
use crate::patient::{NewVisit, Patient, PatientDetails, PatientUpdate, Visit};
use crate::ports::{PatientPort, PatientQuery};

/// Attempts at issuing a free `DOC` code before giving up
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 3;

/// Orchestrates patient CRUD and visit recording over a [`PatientPort`]
#[derive(Clone)]
pub struct PatientService {
    patients: Arc<dyn PatientPort>,
    sequences: Arc<dyn SequencePort>,
    max_code_attempts: u32,
}

impl PatientService {
    pub fn new(patients: Arc<dyn PatientPort>, sequences: Arc<dyn SequencePort>) -> Self {
        Self {
            patients,
            sequences,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    pub fn with_max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }

    /// Registers a patient under the next `DOC` code
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create_patient(&self, details: PatientDetails) -> Result<Patient, PatientError> {
        let now = Utc::now();
        // Validate once up front so a bad request never burns a code
        Patient::new(SequentialCode::first(SequenceKind::Patient), details.clone(), now)?;

        let patients = &self.patients;
        let patient = insert_with_code(
            self.sequences.as_ref(),
            SequenceKind::Patient,
            self.max_code_attempts,
            |code| {
                let details = details.clone();
                async move {
                    let patient = Patient::new(code, details, now)
                        .map_err(|e| PortError::validation(e.to_string()))?;
                    patients.insert_patient(&patient).await?;
                    Ok(patient)
                }
            },
        )
        .await?;

        info!(patient_code = %patient.code, patient_id = %patient.id, "patient registered");
        Ok(patient)
    }

    pub async fn get_patient(&self, id: PatientId) -> Result<Patient, PatientError> {
        Ok(self.patients.get_patient(id).await?)
    }

    pub async fn get_patient_by_code(&self, code: &str) -> Result<Patient, PatientError> {
        Ok(self.patients.get_patient_by_code(code).await?)
    }

    /// Returns one page of matching patients and the total match count
    pub async fn list_patients(&self, query: &PatientQuery) -> Result<(Vec<Patient>, u64), PatientError> {
        let patients = self.patients.find_patients(query).await?;
        let total = self.patients.count_patients(query).await?;
        Ok((patients, total))
    }

    #[instrument(skip(self, update))]
    pub async fn update_patient(&self, id: PatientId, update: PatientUpdate) -> Result<Patient, PatientError> {
        let mut patient = self.patients.get_patient(id).await?;
        patient.apply_update(update, Utc::now())?;
        self.patients.update_patient(&patient).await?;
        info!(patient_code = %patient.code, "patient updated");
        Ok(patient)
    }

    /// Appends a visit and reactivates the patient
    #[instrument(skip(self, visit))]
    pub async fn record_visit(&self, id: PatientId, visit: NewVisit) -> Result<Patient, PatientError> {
        let visit = Visit::from_new(visit, Utc::now())?;
        let patient = self.patients.append_visit(id, visit).await?;
        info!(patient_code = %patient.code, visits = patient.visits.len(), "visit recorded");
        Ok(patient)
    }

    #[instrument(skip(self))]
    pub async fn delete_patient(&self, id: PatientId) -> Result<(), PatientError> {
        self.patients.delete_patient(id).await?;
        info!(patient_id = %id, "patient deleted");
        Ok(())
    }
}
