//! In-memory document store
//!
//! `MemoryStore` keeps every collection behind a single `tokio::sync::RwLock`.
//! Reads share the lock; every write, including the multi-aggregate bill
//! commits, runs inside one write critical section, which gives the same
//! all-or-nothing behaviour as a PostgreSQL transaction.
//!
//! Cloning the store is cheap and clones share state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use core_kernel::{
    next_code_after, AdapterHealth, BillId, DomainPort, HealthCheckResult, HealthCheckable,
    MedicineId, PatientId, PortError, SequenceKind, SequencePort, SequentialCode, ServiceId,
};
use domain_billing::{Bill, BillCommit, BillDeletion, BillPort, BillQuery, MedicineWrite};
use domain_catalog::{CatalogPort, ServiceItem, ServiceQuery};
use domain_inventory::{Medicine, MedicinePort, MedicineQuery};
use domain_patient::{Patient, PatientPort, PatientQuery, Visit};

#[derive(Debug, Default)]
struct State {
    patients: HashMap<PatientId, Patient>,
    medicines: HashMap<MedicineId, Medicine>,
    services: HashMap<ServiceId, ServiceItem>,
    bills: HashMap<BillId, Bill>,
    counters: HashMap<SequenceKind, u64>,
}

impl State {
    fn codes(&self, kind: SequenceKind) -> Vec<&str> {
        match kind {
            SequenceKind::Patient => self.patients.values().map(|p| p.code.as_str()).collect(),
            SequenceKind::Medicine => self.medicines.values().map(|m| m.code.as_str()).collect(),
            SequenceKind::Service => self.services.values().map(|s| s.code.as_str()).collect(),
            SequenceKind::Bill => self.bills.values().map(|b| b.code.as_str()).collect(),
        }
    }

    /// Checks that every guarded medicine write still matches the stored version
    fn check_versions(&self, writes: &[MedicineWrite], missing_is_conflict: bool) -> Result<(), PortError> {
        for write in writes {
            match self.medicines.get(&write.medicine.id) {
                Some(stored) if stored.version == write.expected_version => {}
                Some(stored) => {
                    return Err(PortError::conflict(format!(
                        "medicine {} is at version {}, expected {}",
                        stored.code, stored.version, write.expected_version
                    )))
                }
                None if missing_is_conflict => {
                    return Err(PortError::conflict(format!(
                        "medicine {} was deleted",
                        write.medicine.code
                    )))
                }
                None => return Err(PortError::not_found("medicine", write.medicine.id)),
            }
        }
        Ok(())
    }

    fn apply_writes(&mut self, writes: &[MedicineWrite]) {
        for write in writes {
            let mut medicine = write.medicine.clone();
            medicine.version = write.expected_version + 1;
            self.medicines.insert(medicine.id, medicine);
        }
    }
}

/// Process-local store implementing every clinic port
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Creates an empty store; every sequence starts at `001`
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies `offset` and `limit` to an already filtered and sorted list
fn page<T>(items: Vec<T>, limit: Option<u32>, offset: Option<u32>) -> Vec<T> {
    let offset = offset.unwrap_or(0) as usize;
    let limit = limit.map_or(usize::MAX, |l| l as usize);
    items.into_iter().skip(offset).take(limit).collect()
}

/// Numeric part of a stored code, for ordering ties
fn code_number(kind: SequenceKind, code: &str) -> u64 {
    SequentialCode::parse_as(kind, code).map_or(0, |c| c.number())
}

impl DomainPort for MemoryStore {}

#[async_trait]
impl HealthCheckable for MemoryStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let records = {
            let state = self.state.read().await;
            state.patients.len() + state.medicines.len() + state.services.len() + state.bills.len()
        };
        HealthCheckResult {
            adapter_id: "memory-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            message: Some(format!("{records} records held in memory")),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SequencePort for MemoryStore {
    async fn next_value(&self, kind: SequenceKind) -> Result<u64, PortError> {
        let mut state = self.state.write().await;
        let value = match state.counters.get(&kind) {
            Some(current) => current.saturating_add(1),
            None => next_code_after(kind, state.codes(kind)).number(),
        };
        state.counters.insert(kind, value);
        debug!(%kind, value, "sequence advanced");
        Ok(value)
    }
}

#[async_trait]
impl PatientPort for MemoryStore {
    async fn get_patient(&self, id: PatientId) -> Result<Patient, PortError> {
        let state = self.state.read().await;
        state
            .patients
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("patient", id))
    }

    async fn get_patient_by_code(&self, code: &str) -> Result<Patient, PortError> {
        let state = self.state.read().await;
        state
            .patients
            .values()
            .find(|p| p.code == code)
            .cloned()
            .ok_or_else(|| PortError::not_found("patient", code))
    }

    async fn find_patients(&self, query: &PatientQuery) -> Result<Vec<Patient>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<Patient> = state.patients.values().filter(|p| query.matches(p)).cloned().collect();
        found.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| {
                code_number(SequenceKind::Patient, &b.code).cmp(&code_number(SequenceKind::Patient, &a.code))
            })
        });
        Ok(page(found, query.limit, query.offset))
    }

    async fn count_patients(&self, query: &PatientQuery) -> Result<u64, PortError> {
        let state = self.state.read().await;
        Ok(state.patients.values().filter(|p| query.matches(p)).count() as u64)
    }

    #[instrument(skip(self, patient), fields(code = %patient.code))]
    async fn insert_patient(&self, patient: &Patient) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.patients.values().any(|p| p.code == patient.code) {
            return Err(PortError::duplicate("patient code", &patient.code));
        }
        state.patients.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn update_patient(&self, patient: &Patient) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .patients
            .get_mut(&patient.id)
            .ok_or_else(|| PortError::not_found("patient", patient.id))?;
        // Visits and last visit are only moved by append_visit and bill commits
        let visits = std::mem::take(&mut stored.visits);
        let last_visit = stored.last_visit;
        *stored = Patient {
            visits,
            last_visit,
            ..patient.clone()
        };
        Ok(())
    }

    async fn append_visit(&self, id: PatientId, visit: Visit) -> Result<Patient, PortError> {
        let mut state = self.state.write().await;
        let patient = state
            .patients
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("patient", id))?;
        patient.push_visit(visit, Utc::now());
        Ok(patient.clone())
    }

    async fn delete_patient(&self, id: PatientId) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        state
            .patients
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("patient", id))
    }
}

#[async_trait]
impl MedicinePort for MemoryStore {
    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, PortError> {
        let state = self.state.read().await;
        state
            .medicines
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("medicine", id))
    }

    async fn get_medicine_by_code(&self, code: &str) -> Result<Medicine, PortError> {
        let state = self.state.read().await;
        state
            .medicines
            .values()
            .find(|m| m.code == code)
            .cloned()
            .ok_or_else(|| PortError::not_found("medicine", code))
    }

    async fn find_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<Medicine> = state.medicines.values().filter(|m| query.matches(m)).cloned().collect();
        found.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| {
                    code_number(SequenceKind::Medicine, &a.code).cmp(&code_number(SequenceKind::Medicine, &b.code))
                })
        });
        Ok(page(found, query.limit, query.offset))
    }

    async fn count_medicines(&self, query: &MedicineQuery) -> Result<u64, PortError> {
        let state = self.state.read().await;
        Ok(state.medicines.values().filter(|m| query.matches(m)).count() as u64)
    }

    #[instrument(skip(self, medicine), fields(code = %medicine.code))]
    async fn insert_medicine(&self, medicine: &Medicine) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.medicines.values().any(|m| m.code == medicine.code) {
            return Err(PortError::duplicate("medicine code", &medicine.code));
        }
        state.medicines.insert(medicine.id, medicine.clone());
        Ok(())
    }

    async fn replace_medicine(&self, medicine: &Medicine, expected_version: u64) -> Result<Medicine, PortError> {
        let mut state = self.state.write().await;
        let write = MedicineWrite {
            medicine: medicine.clone(),
            expected_version,
        };
        state.check_versions(std::slice::from_ref(&write), false)?;
        state.apply_writes(std::slice::from_ref(&write));
        state
            .medicines
            .get(&medicine.id)
            .cloned()
            .ok_or_else(|| PortError::not_found("medicine", medicine.id))
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        state
            .medicines
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("medicine", id))
    }
}

#[async_trait]
impl CatalogPort for MemoryStore {
    async fn get_service(&self, id: ServiceId) -> Result<ServiceItem, PortError> {
        let state = self.state.read().await;
        state
            .services
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("service", id))
    }

    async fn get_service_by_code(&self, code: &str) -> Result<ServiceItem, PortError> {
        let state = self.state.read().await;
        state
            .services
            .values()
            .find(|s| s.code == code)
            .cloned()
            .ok_or_else(|| PortError::not_found("service", code))
    }

    async fn find_services(&self, query: &ServiceQuery) -> Result<Vec<ServiceItem>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<ServiceItem> = state.services.values().filter(|s| query.matches(s)).cloned().collect();
        found.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| {
                    code_number(SequenceKind::Service, &a.code).cmp(&code_number(SequenceKind::Service, &b.code))
                })
        });
        Ok(found)
    }

    #[instrument(skip(self, service), fields(code = %service.code))]
    async fn insert_service(&self, service: &ServiceItem) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.services.values().any(|s| s.code == service.code) {
            return Err(PortError::duplicate("service code", &service.code));
        }
        state.services.insert(service.id, service.clone());
        Ok(())
    }

    async fn update_service(&self, service: &ServiceItem) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .services
            .get_mut(&service.id)
            .ok_or_else(|| PortError::not_found("service", service.id))?;
        *stored = service.clone();
        Ok(())
    }
}

#[async_trait]
impl BillPort for MemoryStore {
    async fn get_bill(&self, id: BillId) -> Result<Bill, PortError> {
        let state = self.state.read().await;
        state
            .bills
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("bill", id))
    }

    async fn get_bill_by_code(&self, code: &str) -> Result<Bill, PortError> {
        let state = self.state.read().await;
        state
            .bills
            .values()
            .find(|b| b.code == code)
            .cloned()
            .ok_or_else(|| PortError::not_found("bill", code))
    }

    async fn find_bills(&self, query: &BillQuery) -> Result<Vec<Bill>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<Bill> = state.bills.values().filter(|b| query.matches(b)).cloned().collect();
        found.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| {
                code_number(SequenceKind::Bill, &b.code).cmp(&code_number(SequenceKind::Bill, &a.code))
            })
        });
        Ok(page(found, query.limit, query.offset))
    }

    async fn count_bills(&self, query: &BillQuery) -> Result<u64, PortError> {
        let state = self.state.read().await;
        Ok(state.bills.values().filter(|b| query.matches(b)).count() as u64)
    }

    #[instrument(skip(self, commit), fields(code = %commit.bill.code))]
    async fn commit_bill(&self, commit: &BillCommit) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.bills.values().any(|b| b.code == commit.bill.code) {
            return Err(PortError::duplicate("bill code", &commit.bill.code));
        }
        if !state.patients.contains_key(&commit.patient()) {
            return Err(PortError::not_found("patient", commit.patient()));
        }
        state.check_versions(&commit.medicines, false)?;

        state.apply_writes(&commit.medicines);
        if let Some(patient) = state.patients.get_mut(&commit.patient()) {
            patient.touch_last_visit(commit.visited_at());
        }
        state.bills.insert(commit.bill.id, commit.bill.clone());
        debug!(medicines = commit.medicines.len(), "bill committed");
        Ok(())
    }

    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .bills
            .get_mut(&bill.id)
            .ok_or_else(|| PortError::not_found("bill", bill.id))?;
        stored.payment_status = bill.payment_status;
        stored.payment_method = bill.payment_method;
        stored.notes.clone_from(&bill.notes);
        stored.medicines_total = bill.medicines_total;
        stored.services_total = bill.services_total;
        stored.total_amount = bill.total_amount;
        stored.updated_at = bill.updated_at;
        Ok(())
    }

    #[instrument(skip(self, deletion), fields(bill = %deletion.bill))]
    async fn commit_deletion(&self, deletion: &BillDeletion) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.bills.contains_key(&deletion.bill) {
            return Err(PortError::not_found("bill", deletion.bill));
        }
        state.check_versions(&deletion.medicines, true)?;

        state.apply_writes(&deletion.medicines);
        state.bills.remove(&deletion.bill);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_applies_offset_then_limit() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(page(items.clone(), Some(3), Some(2)), vec![3, 4, 5]);
        assert_eq!(page(items.clone(), None, Some(8)), vec![9, 10]);
        assert_eq!(page(items, Some(5), Some(20)), Vec::<u32>::new());
    }

    #[test]
    fn test_code_number_orders_numerically() {
        assert!(code_number(SequenceKind::Bill, "BILL1000") > code_number(SequenceKind::Bill, "BILL999"));
        assert_eq!(code_number(SequenceKind::Bill, "garbage"), 0);
    }

    #[tokio::test]
    async fn test_sequences_start_at_one_per_kind() {
        let store = MemoryStore::new();
        assert_eq!(store.next_value(SequenceKind::Bill).await.unwrap(), 1);
        assert_eq!(store.next_value(SequenceKind::Bill).await.unwrap(), 2);
        assert_eq!(store.next_value(SequenceKind::Patient).await.unwrap(), 1);
        assert_eq!(store.issue_code(SequenceKind::Medicine).await.unwrap().to_string(), "MED001");
    }

    #[tokio::test]
    async fn test_health_check_is_healthy() {
        let result = MemoryStore::new().health_check().await;
        assert_eq!(result.status, AdapterHealth::Healthy);
        assert_eq!(result.adapter_id, "memory-store");
    }
}
