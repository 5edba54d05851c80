//! Core Kernel - Foundational types and utilities for the clinic system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed storage identifiers
//! - Sequential human-readable codes (`BILL001`, `MED001`, ...)
//! - Port infrastructure shared by every storage adapter

pub mod money;
pub mod identifiers;
pub mod sequence;
pub mod ports;

pub use money::{Money, Currency, MoneyError, percentage_floor, MAX_AMOUNT};
pub use identifiers::{PatientId, MedicineId, ServiceId, BillId};
pub use sequence::{
    SequenceKind, SequentialCode, SequencePort, CodeError, next_code_after, insert_with_code,
};
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
