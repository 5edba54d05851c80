//! Test Data Builders
//!
//! Builders with valid defaults, so a test states only the fields it cares
//! about. Names and phone numbers are drawn from `fake`.

use chrono::NaiveDate;
use core_kernel::{Currency, MedicineId, Money, PatientId, ServiceId};
use domain_billing::{CreateInvoiceRequest, MedicineLineRequest, PaymentMethod, PaymentStatus};
use domain_catalog::ServiceDetails;
use domain_inventory::MedicineDetails;
use domain_patient::{Gender, PatientDetails};
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::DateFixtures;

/// A ten-digit mobile number
pub fn fake_phone() -> String {
    let number: u32 = (0..100_000_000).fake();
    format!("98{number:08}")
}

/// Builder for patient registrations
pub struct PatientDetailsBuilder {
    details: PatientDetails,
}

impl Default for PatientDetailsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientDetailsBuilder {
    pub fn new() -> Self {
        let name: String = Name().fake();
        let age: u32 = (1..90).fake();
        Self {
            details: PatientDetails::new(name, age, Gender::Female, fake_phone()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.details.name = name.into();
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.details.age = age;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.details.phone = phone.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.details.email = Some(email.into());
        self
    }

    pub fn with_allergies(mut self, allergies: &[&str]) -> Self {
        self.details.allergies = allergies.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn build(self) -> PatientDetails {
        self.details
    }
}

/// Builder for new medicines; prices are INR, buying at 60% of selling
pub struct MedicineDetailsBuilder {
    name: String,
    category: String,
    manufacturer: Option<String>,
    selling_price: Decimal,
    buying_price: Option<Decimal>,
    stock: u32,
    min_stock_level: Option<u32>,
    expiry_date: NaiveDate,
    currency: Currency,
}

impl Default for MedicineDetailsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicineDetailsBuilder {
    pub fn new() -> Self {
        let word: String = Word().fake();
        Self {
            name: format!("{word} 500mg"),
            category: "General".to_string(),
            manufacturer: Some(CompanyName().fake()),
            selling_price: dec!(50),
            buying_price: None,
            stock: 100,
            min_stock_level: Some(10),
            expiry_date: DateFixtures::far_expiry(),
            currency: Currency::INR,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_selling_price(mut self, price: Decimal) -> Self {
        self.selling_price = price;
        self
    }

    pub fn with_buying_price(mut self, price: Decimal) -> Self {
        self.buying_price = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_min_stock_level(mut self, level: u32) -> Self {
        self.min_stock_level = Some(level);
        self
    }

    pub fn with_expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = date;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn build(self) -> MedicineDetails {
        let buying = self
            .buying_price
            .unwrap_or_else(|| (self.selling_price * dec!(0.6)).round_dp(2));
        MedicineDetails {
            name: self.name,
            generic_name: None,
            category: self.category,
            manufacturer: self.manufacturer,
            batch_number: Some(format!("B{:05}", (0..100_000u32).fake::<u32>())),
            description: None,
            buying_price: Money::new(buying, self.currency),
            selling_price: Money::new(self.selling_price, self.currency),
            stock: self.stock,
            min_stock_level: self.min_stock_level,
            expiry_date: self.expiry_date,
        }
    }
}

/// Builder for catalog services
pub struct ServiceDetailsBuilder {
    details: ServiceDetails,
}

impl Default for ServiceDetailsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDetailsBuilder {
    pub fn new() -> Self {
        let word: String = Word().fake();
        Self {
            details: ServiceDetails {
                name: format!("{word} consultation"),
                description: None,
                category: "Diagnostics".to_string(),
                price: Money::new(dec!(300), Currency::INR),
                duration: Some("30 min".to_string()),
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.details.name = name.into();
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.details.price = Money::new(price, self.details.price.currency());
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.details.price = Money::new(self.details.price.amount(), currency);
        self
    }

    pub fn build(self) -> ServiceDetails {
        self.details
    }
}

/// Builder for invoice requests against existing records
pub struct InvoiceRequestBuilder {
    request: CreateInvoiceRequest,
}

impl InvoiceRequestBuilder {
    pub fn for_patient(patient: PatientId) -> Self {
        Self {
            request: CreateInvoiceRequest {
                patient,
                consultation_fee: None,
                medicines: Vec::new(),
                services: Vec::new(),
                payment_status: None,
                payment_method: None,
                notes: None,
            },
        }
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.request.consultation_fee = Some(fee);
        self
    }

    pub fn with_medicine(mut self, medicine: MedicineId, quantity: u32) -> Self {
        self.request.medicines.push(MedicineLineRequest { medicine, quantity });
        self
    }

    pub fn with_service(mut self, service: ServiceId) -> Self {
        self.request.services.push(service);
        self
    }

    pub fn paid_by(mut self, method: PaymentMethod) -> Self {
        self.request.payment_status = Some(PaymentStatus::Paid);
        self.request.payment_method = Some(method);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> CreateInvoiceRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_phone_has_ten_digits() {
        let phone = fake_phone();
        assert_eq!(phone.len(), 10);
        assert!(phone.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_medicine_builder_defaults() {
        let details = MedicineDetailsBuilder::new().with_selling_price(dec!(50)).build();
        assert_eq!(details.buying_price.amount(), dec!(30));
        assert_eq!(details.selling_price.currency(), Currency::INR);
        assert_eq!(details.min_stock_level, Some(10));
    }
}
