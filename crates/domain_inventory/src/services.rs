//! Inventory application service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument, warn};

use core_kernel::{insert_with_code, MedicineId, PortError, SequenceKind, SequencePort, SequentialCode};

use crate::error::InventoryError;
use crate::medicine::{Medicine, MedicineDetails, MedicineUpdate};
use crate::ports::{MedicinePort, MedicineQuery};
use crate::status::MedicineStatus;
use crate::stock::StockOperation;

/// Tunables for the inventory service
#[derive(Debug, Clone)]
pub struct InventorySettings {
    /// Attempts at issuing a free `MED` code
    pub max_code_attempts: u32,
    /// Attempts at a version-guarded write before reporting a conflict
    pub max_conflict_retries: u32,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            max_code_attempts: 3,
            max_conflict_retries: 5,
        }
    }
}

/// Medicines needing attention, grouped by status
#[derive(Debug, Clone, Default)]
pub struct StockAlerts {
    pub low_stock: Vec<Medicine>,
    pub out_of_stock: Vec<Medicine>,
    pub expiring_soon: Vec<Medicine>,
}

impl StockAlerts {
    pub fn is_empty(&self) -> bool {
        self.low_stock.is_empty() && self.out_of_stock.is_empty() && self.expiring_soon.is_empty()
    }
}

/// Orchestrates medicine CRUD and manual stock changes
#[derive(Clone)]
pub struct InventoryService {
    medicines: Arc<dyn MedicinePort>,
    sequences: Arc<dyn SequencePort>,
    settings: InventorySettings,
}

impl InventoryService {
    pub fn new(medicines: Arc<dyn MedicinePort>, sequences: Arc<dyn SequencePort>) -> Self {
        Self::with_settings(medicines, sequences, InventorySettings::default())
    }

    pub fn with_settings(
        medicines: Arc<dyn MedicinePort>,
        sequences: Arc<dyn SequencePort>,
        settings: InventorySettings,
    ) -> Self {
        Self {
            medicines,
            sequences,
            settings,
        }
    }

    /// Adds a medicine under the next `MED` code
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create_medicine(&self, details: MedicineDetails) -> Result<Medicine, InventoryError> {
        let now = Utc::now();
        let today = now.date_naive();
        Medicine::new(SequentialCode::first(SequenceKind::Medicine), details.clone(), today, now)?;

        let medicines = &self.medicines;
        let medicine = insert_with_code(
            self.sequences.as_ref(),
            SequenceKind::Medicine,
            self.settings.max_code_attempts,
            |code| {
                let details = details.clone();
                async move {
                    let medicine = Medicine::new(code, details, today, now)
                        .map_err(|e| PortError::validation(e.to_string()))?;
                    medicines.insert_medicine(&medicine).await?;
                    Ok(medicine)
                }
            },
        )
        .await?;

        info!(
            medicine_code = %medicine.code,
            stock = medicine.stock,
            status = %medicine.status,
            "medicine added"
        );
        Ok(medicine)
    }

    pub async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, InventoryError> {
        Ok(self.medicines.get_medicine(id).await?)
    }

    pub async fn get_medicine_by_code(&self, code: &str) -> Result<Medicine, InventoryError> {
        Ok(self.medicines.get_medicine_by_code(code).await?)
    }

    /// Returns one page of matching medicines and the total match count
    pub async fn list_medicines(&self, query: &MedicineQuery) -> Result<(Vec<Medicine>, u64), InventoryError> {
        let medicines = self.medicines.find_medicines(query).await?;
        let total = self.medicines.count_medicines(query).await?;
        Ok((medicines, total))
    }

    /// Edits descriptive and pricing fields
    #[instrument(skip(self, update))]
    pub async fn update_medicine(&self, id: MedicineId, update: MedicineUpdate) -> Result<Medicine, InventoryError> {
        let now = Utc::now();
        let medicine = self
            .modify(id, |medicine| medicine.apply_update(update.clone(), now.date_naive(), now))
            .await?;
        info!(medicine_code = %medicine.code, status = %medicine.status, "medicine updated");
        Ok(medicine)
    }

    /// Applies a manual stock adjustment
    ///
    /// `Subtract` stops at zero rather than failing. A result above
    /// `MAX_STOCK` is a validation error.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        id: MedicineId,
        quantity: u32,
        operation: StockOperation,
    ) -> Result<Medicine, InventoryError> {
        let now = Utc::now();
        let medicine = self
            .modify(id, |medicine| {
                medicine.adjust_stock(quantity, operation, now.date_naive())?;
                medicine.updated_at = now;
                Ok(())
            })
            .await?;
        info!(
            medicine_code = %medicine.code,
            %operation,
            quantity,
            stock = medicine.stock,
            status = %medicine.status,
            "stock adjusted"
        );
        Ok(medicine)
    }

    #[instrument(skip(self))]
    pub async fn delete_medicine(&self, id: MedicineId) -> Result<(), InventoryError> {
        self.medicines.delete_medicine(id).await?;
        info!(medicine_id = %id, "medicine deleted");
        Ok(())
    }

    /// Low-stock, out-of-stock and expiring medicines as of today
    pub async fn stock_alerts(&self) -> Result<StockAlerts, InventoryError> {
        let today = Utc::now().date_naive();
        let medicines = self.medicines.find_medicines(&MedicineQuery::default()).await?;
        Ok(group_alerts(medicines, today))
    }

    /// Reads, changes and conditionally writes a medicine, retrying stale reads
    async fn modify<F>(&self, id: MedicineId, mut change: F) -> Result<Medicine, InventoryError>
    where
        F: FnMut(&mut Medicine) -> Result<(), InventoryError> + Send,
    {
        let attempts = self.settings.max_conflict_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut medicine = self.medicines.get_medicine(id).await?;
            let expected_version = medicine.version;
            change(&mut medicine)?;

            match self.medicines.replace_medicine(&medicine, expected_version).await {
                Ok(stored) => return Ok(stored),
                Err(err) if err.is_conflict() && attempt < attempts => {
                    warn!(medicine_code = %medicine.code, attempt, "medicine changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Buckets medicines by their status re-derived for `today`
///
/// Stored statuses are only refreshed on writes, so each one is re-derived here.
pub fn group_alerts(medicines: Vec<Medicine>, today: NaiveDate) -> StockAlerts {
    let mut alerts = StockAlerts::default();
    for mut medicine in medicines {
        medicine.refresh_status(today);
        match medicine.status {
            MedicineStatus::LowStock => alerts.low_stock.push(medicine),
            MedicineStatus::OutOfStock => alerts.out_of_stock.push(medicine),
            MedicineStatus::ExpiringSoon => alerts.expiring_soon.push(medicine),
            MedicineStatus::InStock => {}
        }
    }
    alerts
}
