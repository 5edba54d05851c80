//! Medicine Inventory Domain
//!
//! Tracks every medicine on the shelf: prices, stock, minimum stock level and
//! expiry. A medicine's [`MedicineStatus`] is a pure function of its stock,
//! expiry date and minimum level, recomputed explicitly before each write.
//!
//! Stock only moves through [`Medicine::withdraw`], [`Medicine::restock`] and
//! [`Medicine::adjust_stock`], none of which can take it below zero. Every
//! stored write is guarded by the medicine's `version`, so two requests that
//! read the same stock cannot both spend it.

pub mod status;
pub mod stock;
pub mod medicine;
pub mod error;
pub mod ports;
pub mod services;

pub use status::{MedicineStatus, EXPIRY_WARNING_DAYS};
pub use stock::{StockOperation, MAX_STOCK};
pub use medicine::{Medicine, MedicineDetails, MedicineUpdate, DEFAULT_MIN_STOCK_LEVEL};
pub use error::InventoryError;
pub use ports::{MedicinePort, MedicineQuery};
pub use services::{group_alerts, InventoryService, InventorySettings, StockAlerts};
