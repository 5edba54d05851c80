//! Billing Ledger Service
//!
//! The ledger turns an invoice request into a persisted bill and keeps
//! medicine stock in step with it.
//!
//! # Creating a bill
//!
//! 1. The request is validated (fee, quantities, notes).
//! 2. The patient, every medicine and every service are resolved.
//! 3. Each medicine line is withdrawn from an in-memory copy of its medicine,
//!    so several lines for one medicine accumulate. Any shortfall rejects the
//!    whole bill before anything is written.
//! 4. Totals are computed and a `BILL` code is issued.
//! 5. The bill, the withdrawn medicines and the patient's last visit are
//!    committed in one atomic step. Each medicine write is guarded by the
//!    version it was read at.
//!
//! A stale medicine version means another request moved the stock; the
//! ledger re-reads and re-validates from step 2. A taken code is re-issued.
//! Both retries are bounded by [`BillingSettings`].
//!
//! # Deleting a bill
//!
//! Each line's quantity is restored onto the current medicine and the bill
//! is removed, again in one atomic, version-guarded step.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument, warn};

use core_kernel::{
    insert_with_code, BillId, Currency, MedicineId, Money, PatientId, PortError, SequenceKind,
    SequencePort, SequentialCode, ServiceId,
};
use domain_catalog::CatalogPort;
use domain_inventory::{Medicine, MedicinePort};
use domain_patient::PatientPort;

use crate::bill::{compute_totals, validate_notes, Bill, MedicineLine, PaymentUpdate, ServiceLine};
use crate::error::LedgerError;
use crate::payment::{PaymentMethod, PaymentStatus};
use crate::ports::{BillCommit, BillDeletion, BillPort, BillQuery, MedicineWrite};

/// Standard consultation fee charged when a request does not name one
pub const DEFAULT_CONSULTATION_FEE: Decimal = dec!(500);

/// Tunables for the ledger
#[derive(Debug, Clone)]
pub struct BillingSettings {
    /// Fee applied when a request does not name one
    pub consultation_fee: Decimal,
    /// Currency every bill is issued in
    pub currency: Currency,
    /// Attempts at issuing a free `BILL` code
    pub max_code_attempts: u32,
    /// Attempts at committing against concurrently changing stock
    pub max_conflict_retries: u32,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            consultation_fee: DEFAULT_CONSULTATION_FEE,
            currency: Currency::default(),
            max_code_attempts: 3,
            max_conflict_retries: 5,
        }
    }
}

/// One medicine line requested on a new bill
#[derive(Debug, Clone, Copy)]
pub struct MedicineLineRequest {
    pub medicine: MedicineId,
    pub quantity: u32,
}

/// Input to [`LedgerService::create_invoice`]
#[derive(Debug, Clone, Default)]
pub struct CreateInvoiceRequest {
    pub patient: PatientId,
    /// Defaults to the configured consultation fee
    pub consultation_fee: Option<Decimal>,
    pub medicines: Vec<MedicineLineRequest>,
    pub services: Vec<ServiceId>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// The billing ledger
#[derive(Clone)]
pub struct LedgerService {
    patients: Arc<dyn PatientPort>,
    medicines: Arc<dyn MedicinePort>,
    catalog: Arc<dyn CatalogPort>,
    bills: Arc<dyn BillPort>,
    sequences: Arc<dyn SequencePort>,
    settings: BillingSettings,
}

/// Medicine lines and the stock writes backing them
struct PreparedMedicines {
    lines: Vec<MedicineLine>,
    writes: Vec<MedicineWrite>,
}

impl LedgerService {
    /// Builds a ledger over a store implementing every port it needs
    pub fn new<S>(store: Arc<S>, settings: BillingSettings) -> Self
    where
        S: PatientPort + MedicinePort + CatalogPort + BillPort + SequencePort,
    {
        Self {
            patients: store.clone(),
            medicines: store.clone(),
            catalog: store.clone(),
            bills: store.clone(),
            sequences: store,
            settings,
        }
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Creates a bill and withdraws its medicines from stock
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative fee, a zero quantity, overlong notes,
    ///   an inactive service, a price in a foreign currency, or totals too
    ///   large to store
    /// - `NotFound` for an unknown patient, medicine or service
    /// - `InsufficientStock` when any medicine cannot cover its lines
    /// - `IdentifierConflict` when no `BILL` code could be secured
    /// - `StorageUnavailable` when the store fails or stock keeps changing
    #[instrument(skip(self, request), fields(patient = %request.patient, medicine_lines = request.medicines.len(), service_lines = request.services.len()))]
    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Bill, LedgerError> {
        let currency = self.settings.currency;
        let fee = request.consultation_fee.unwrap_or(self.settings.consultation_fee);
        let consultation_fee = Money::non_negative(fee, currency)
            .map_err(|e| LedgerError::validation(format!("consultation fee: {e}")))?;
        if let Some(line) = request.medicines.iter().find(|line| line.quantity == 0) {
            return Err(LedgerError::validation(format!(
                "quantity for medicine {} must be at least 1",
                line.medicine
            )));
        }
        validate_notes(request.notes.as_deref()).map_err(LedgerError::Validation)?;

        let patient = self
            .patients
            .get_patient(request.patient)
            .await
            .map_err(|e| not_found_as(e, "patient", request.patient))?;
        let services = self.resolve_services(&request.services, currency).await?;

        let attempts = self.settings.max_conflict_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let prepared = self.prepare_medicines(&request.medicines, currency, now.date_naive()).await?;
            let totals = compute_totals(&consultation_fee, &prepared.lines, &services, currency)?;

            let draft = Bill {
                id: BillId::new_v7(),
                code: String::new(),
                patient: patient.id,
                patient_name: patient.name.clone(),
                patient_phone: patient.phone.clone(),
                consultation_fee,
                medicines: prepared.lines,
                services: services.clone(),
                medicines_total: totals.medicines_total,
                services_total: totals.services_total,
                total_amount: totals.total_amount,
                payment_status: request.payment_status.unwrap_or_default(),
                payment_method: request.payment_method,
                notes: request.notes.clone(),
                created_at: now,
                updated_at: now,
            };

            let bills = &self.bills;
            let writes = &prepared.writes;
            let committed = insert_with_code(
                self.sequences.as_ref(),
                SequenceKind::Bill,
                self.settings.max_code_attempts,
                |code| {
                    let commit = BillCommit {
                        bill: Bill {
                            code: code.to_string(),
                            ..draft.clone()
                        },
                        medicines: writes.clone(),
                    };
                    async move {
                        bills.commit_bill(&commit).await?;
                        Ok(commit.bill)
                    }
                },
            )
            .await;

            match committed {
                Ok(bill) => {
                    info!(
                        bill_code = %bill.code,
                        patient_code = %patient.code,
                        total = %bill.total_amount,
                        "bill created"
                    );
                    return Ok(bill);
                }
                Err(err) if err.is_conflict() && attempt < attempts => {
                    warn!(attempt, "stock changed while billing, re-validating");
                }
                Err(err) if err.is_conflict() => {
                    return Err(LedgerError::StorageUnavailable(format!(
                        "stock kept changing after {attempts} attempts, please retry"
                    )));
                }
                Err(PortError::Duplicate { value, .. }) => {
                    return Err(LedgerError::IdentifierConflict(format!(
                        "could not secure a bill code, last tried {value}"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Changes payment status, method and notes of an existing bill
    ///
    /// `Some(None)` clears the method or notes.
    #[instrument(skip(self, update))]
    pub async fn update_invoice_payment(&self, id: BillId, update: PaymentUpdate) -> Result<Bill, LedgerError> {
        validate_notes(update.notes.as_ref().and_then(Option::as_deref)).map_err(LedgerError::Validation)?;

        let mut bill = self.bills.get_bill(id).await.map_err(|e| not_found_as(e, "bill", id))?;
        if let Some(status) = update.payment_status {
            bill.payment_status = status;
        }
        if let Some(method) = update.payment_method {
            bill.payment_method = method;
        }
        if let Some(notes) = update.notes {
            bill.notes = notes;
        }
        bill.refresh_totals()?;
        bill.updated_at = Utc::now();

        self.bills.update_bill(&bill).await.map_err(|e| not_found_as(e, "bill", id))?;
        info!(bill_code = %bill.code, payment_status = %bill.payment_status, "bill payment updated");
        Ok(bill)
    }

    /// Deletes a bill and puts its medicines back on the shelf
    ///
    /// Medicines deleted since the bill was created are skipped.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: BillId) -> Result<(), LedgerError> {
        let attempts = self.settings.max_conflict_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let bill = self.bills.get_bill(id).await.map_err(|e| not_found_as(e, "bill", id))?;
            let today = Utc::now().date_naive();

            let mut writes: Vec<MedicineWrite> = Vec::new();
            let mut missing: HashSet<MedicineId> = HashSet::new();
            for line in &bill.medicines {
                if missing.contains(&line.medicine) {
                    continue;
                }
                let index = match writes.iter().position(|w| w.medicine.id == line.medicine) {
                    Some(index) => index,
                    None => match self.medicines.get_medicine(line.medicine).await {
                        Ok(medicine) => {
                            writes.push(MedicineWrite {
                                expected_version: medicine.version,
                                medicine,
                            });
                            writes.len() - 1
                        }
                        Err(err) if err.is_not_found() => {
                            warn!(bill_code = %bill.code, medicine = %line.name, "medicine no longer exists, stock not restored");
                            missing.insert(line.medicine);
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    },
                };
                let write = &mut writes[index];
                write.medicine.restock(line.quantity, today)?;
                write.medicine.updated_at = Utc::now();
            }

            let deletion = BillDeletion {
                bill: bill.id,
                medicines: writes,
            };
            match self.bills.commit_deletion(&deletion).await {
                Ok(()) => {
                    info!(bill_code = %bill.code, restored = deletion.medicines.len(), "bill deleted, stock restored");
                    return Ok(());
                }
                Err(err) if err.is_conflict() && attempt < attempts => {
                    warn!(bill_code = %bill.code, attempt, "stock changed while deleting bill, retrying");
                }
                Err(err) if err.is_conflict() => {
                    return Err(LedgerError::StorageUnavailable(format!(
                        "stock kept changing after {attempts} attempts, please retry"
                    )));
                }
                Err(err) => return Err(not_found_as(err, "bill", id)),
            }
        }
    }

    pub async fn get_invoice(&self, id: BillId) -> Result<Bill, LedgerError> {
        self.bills.get_bill(id).await.map_err(|e| not_found_as(e, "bill", id))
    }

    pub async fn get_invoice_by_code(&self, code: &str) -> Result<Bill, LedgerError> {
        self.bills
            .get_bill_by_code(code)
            .await
            .map_err(|e| not_found_as(e, "bill", code))
    }

    /// Returns one page of matching bills, newest first, and the total match count
    pub async fn list_invoices(&self, query: &BillQuery) -> Result<(Vec<Bill>, u64), LedgerError> {
        let bills = self.bills.find_bills(query).await?;
        let total = self.bills.count_bills(query).await?;
        Ok((bills, total))
    }

    pub async fn count_invoices(&self, query: &BillQuery) -> Result<u64, LedgerError> {
        Ok(self.bills.count_bills(query).await?)
    }

    /// Reserves the next sequential code of `kind`
    ///
    /// The code is consumed; a caller that does not use it leaves a gap.
    pub async fn next_identifier(&self, kind: SequenceKind) -> Result<SequentialCode, LedgerError> {
        let code = self.sequences.issue_code(kind).await?;
        info!(%kind, %code, "identifier reserved");
        Ok(code)
    }

    /// Loads each medicine once, withdraws every line from the loaded copy and
    /// snapshots the lines
    async fn prepare_medicines(
        &self,
        requests: &[MedicineLineRequest],
        currency: Currency,
        today: NaiveDate,
    ) -> Result<PreparedMedicines, LedgerError> {
        let mut writes: Vec<MedicineWrite> = Vec::new();
        let mut lines = Vec::with_capacity(requests.len());

        for request in requests {
            let index = match writes.iter().position(|w| w.medicine.id == request.medicine) {
                Some(index) => index,
                None => {
                    let medicine = self
                        .medicines
                        .get_medicine(request.medicine)
                        .await
                        .map_err(|e| not_found_as(e, "medicine", request.medicine))?;
                    ensure_currency(&medicine, currency)?;
                    writes.push(MedicineWrite {
                        expected_version: medicine.version,
                        medicine,
                    });
                    writes.len() - 1
                }
            };

            let medicine = &mut writes[index].medicine;
            medicine.withdraw(request.quantity, today)?;
            medicine.updated_at = Utc::now();
            lines.push(MedicineLine::new(
                medicine.id,
                medicine.name.clone(),
                medicine.selling_price,
                request.quantity,
            )?);
        }

        Ok(PreparedMedicines { lines, writes })
    }

    async fn resolve_services(&self, ids: &[ServiceId], currency: Currency) -> Result<Vec<ServiceLine>, LedgerError> {
        let mut lines = Vec::with_capacity(ids.len());
        for &id in ids {
            let service = self
                .catalog
                .get_service(id)
                .await
                .map_err(|e| not_found_as(e, "service", id))?;
            if !service.is_active {
                return Err(LedgerError::validation(format!(
                    "service {} ({}) is no longer offered",
                    service.code, service.name
                )));
            }
            if service.price.currency() != currency {
                return Err(LedgerError::validation(format!(
                    "service {} is priced in {}, bills are issued in {}",
                    service.code,
                    service.price.currency(),
                    currency
                )));
            }
            lines.push(ServiceLine {
                service: service.id,
                name: service.name,
                price: service.price,
            });
        }
        Ok(lines)
    }
}

fn ensure_currency(medicine: &Medicine, currency: Currency) -> Result<(), LedgerError> {
    if medicine.selling_price.currency() != currency {
        return Err(LedgerError::validation(format!(
            "medicine {} is priced in {}, bills are issued in {}",
            medicine.code,
            medicine.selling_price.currency(),
            currency
        )));
    }
    Ok(())
}

/// Names the missing entity when a lookup misses
fn not_found_as(err: PortError, entity: &str, id: impl std::fmt::Display) -> LedgerError {
    if err.is_not_found() {
        LedgerError::not_found(entity, id)
    } else {
        err.into()
    }
}
