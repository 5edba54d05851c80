//! Bill aggregate
//!
//! A bill owns copies of everything it charges for. Medicine and service
//! lines are snapshots taken when the bill is created, so later price or
//! name changes never alter historical bills.
//!
//! Totals are never accepted from callers. [`compute_totals`] derives them
//! from the fee and lines, and [`Bill::refresh_totals`] runs it before every
//! write, which keeps
//! `total_amount == consultation_fee + medicines_total + services_total`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, Currency, MedicineId, Money, MoneyError, PatientId, ServiceId};

use crate::payment::{PaymentMethod, PaymentStatus};

/// Maximum length of the free-text notes on a bill
pub const MAX_NOTES_LEN: usize = 500;

/// A medicine charged on a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineLine {
    pub medicine: MedicineId,
    pub name: String,
    /// Selling price per unit when the bill was created
    pub price: Money,
    pub quantity: u32,
    /// `price × quantity`
    pub total: Money,
}

impl MedicineLine {
    pub fn new(
        medicine: MedicineId,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            medicine,
            name: name.into(),
            price,
            quantity,
            total: price.times(quantity)?.within_limit()?,
        })
    }
}

/// A catalog service charged on a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub service: ServiceId,
    pub name: String,
    pub price: Money,
}

/// Derived amounts of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTotals {
    pub medicines_total: Money,
    pub services_total: Money,
    pub total_amount: Money,
}

/// Sums the fee and every line, all in `currency`
///
/// Medicine lines are charged at `price × quantity` regardless of the stored
/// line total. Fails with `MoneyError::Overflow` when any total leaves the
/// storable range.
pub fn compute_totals(
    consultation_fee: &Money,
    medicines: &[MedicineLine],
    services: &[ServiceLine],
    currency: Currency,
) -> Result<BillTotals, MoneyError> {
    let line_totals = medicines
        .iter()
        .map(|line| line.price.times(line.quantity))
        .collect::<Result<Vec<Money>, _>>()?;
    let medicines_total = Money::sum(&line_totals, currency)?.within_limit()?;
    let services_total = Money::sum(services.iter().map(|line| &line.price), currency)?.within_limit()?;
    let total_amount = Money::zero(currency)
        .checked_add(consultation_fee)?
        .checked_add(&medicines_total)?
        .checked_add(&services_total)?
        .within_limit()?;

    Ok(BillTotals {
        medicines_total,
        services_total,
        total_amount,
    })
}

/// An invoice issued to a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// Sequential `BILL` code, assigned once
    pub code: String,
    pub patient: PatientId,
    /// Snapshot of the patient's name at creation
    pub patient_name: String,
    /// Snapshot of the patient's phone at creation
    pub patient_phone: String,
    pub consultation_fee: Money,
    pub medicines: Vec<MedicineLine>,
    pub services: Vec<ServiceLine>,
    pub medicines_total: Money,
    pub services_total: Money,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Currency every amount on the bill is held in
    pub fn currency(&self) -> Currency {
        self.consultation_fee.currency()
    }

    /// Recomputes line totals and bill totals from the fee and lines
    pub fn refresh_totals(&mut self) -> Result<(), MoneyError> {
        let currency = self.currency();
        for line in &mut self.medicines {
            line.total = line.price.times(line.quantity)?;
        }
        let totals = compute_totals(&self.consultation_fee, &self.medicines, &self.services, currency)?;
        self.medicines_total = totals.medicines_total;
        self.services_total = totals.services_total;
        self.total_amount = totals.total_amount;
        Ok(())
    }

    /// Total units of `medicine` across all lines
    pub fn quantity_of(&self, medicine: MedicineId) -> u32 {
        self.medicines
            .iter()
            .filter(|line| line.medicine == medicine)
            .map(|line| line.quantity)
            .sum()
    }

    /// Case-insensitive match on bill code, patient name or phone
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.code.to_lowercase().contains(&needle)
            || self.patient_name.to_lowercase().contains(&needle)
            || self.patient_phone.contains(term)
    }
}

/// Payment-side changes to an existing bill
///
/// `None` keeps the current value. For the method and notes, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<Option<PaymentMethod>>,
    pub notes: Option<Option<String>>,
}

/// Checks the notes length limit
pub fn validate_notes(notes: Option<&str>) -> Result<(), String> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_LEN => {
            Err(format!("notes must be at most {MAX_NOTES_LEN} characters"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inr(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    #[test]
    fn test_totals_for_standard_bill() {
        let medicines = vec![MedicineLine::new(MedicineId::new(), "Paracetamol", inr(dec!(50)), 2).unwrap()];
        let services = vec![ServiceLine {
            service: ServiceId::new(),
            name: "Dressing".to_string(),
            price: inr(dec!(300)),
        }];

        let totals = compute_totals(&inr(dec!(500)), &medicines, &services, Currency::INR).unwrap();

        assert_eq!(totals.medicines_total.amount(), dec!(100));
        assert_eq!(totals.services_total.amount(), dec!(300));
        assert_eq!(totals.total_amount.amount(), dec!(900));
    }

    #[test]
    fn test_totals_with_no_lines_is_fee() {
        let totals = compute_totals(&inr(dec!(500)), &[], &[], Currency::INR).unwrap();
        assert!(totals.medicines_total.is_zero());
        assert!(totals.services_total.is_zero());
        assert_eq!(totals.total_amount.amount(), dec!(500));
    }

    #[test]
    fn test_totals_ignore_tampered_line_total() {
        let mut line = MedicineLine::new(MedicineId::new(), "Cough syrup", inr(dec!(85)), 3).unwrap();
        line.total = inr(dec!(1));
        let totals = compute_totals(&inr(dec!(0)), &[line], &[], Currency::INR).unwrap();
        assert_eq!(totals.medicines_total.amount(), dec!(255));
    }

    #[test]
    fn test_totals_reject_currency_mismatch() {
        let line = MedicineLine::new(MedicineId::new(), "Imported", Money::new(dec!(5), Currency::USD), 1).unwrap();
        assert!(compute_totals(&inr(dec!(500)), &[line], &[], Currency::INR).is_err());
    }

    #[test]
    fn test_totals_past_storable_range_are_rejected() {
        let price = inr(core_kernel::MAX_AMOUNT);
        let line = MedicineLine {
            medicine: MedicineId::new(),
            name: "Rare antivenom".to_string(),
            price,
            quantity: 2,
            total: price,
        };
        let result = compute_totals(&inr(dec!(500)), &[line], &[], Currency::INR);
        assert!(matches!(result, Err(MoneyError::Overflow(_))));

        assert!(MedicineLine::new(MedicineId::new(), "Rare antivenom", price, 2).is_err());
    }

    #[test]
    fn test_notes_limit() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some(&"a".repeat(MAX_NOTES_LEN))).is_ok());
        assert!(validate_notes(Some(&"a".repeat(MAX_NOTES_LEN + 1))).is_err());
    }
}
