//! Strongly-typed identifiers for domain entities
//!
//! Storage keys are newtype wrappers around UUIDs, which keeps a bill's
//! patient reference from being confused with a medicine reference.
//! Human-facing codes such as `BILL001` live in [`crate::sequence`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(PatientId, "PAT");
define_id!(MedicineId, "MED");
define_id!(ServiceId, "SER");
define_id!(BillId, "BILL");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_id_display() {
        let id = BillId::new();
        assert!(id.to_string().starts_with("BILL-"));
    }

    #[test]
    fn test_display_prefixes() {
        assert!(PatientId::new().to_string().starts_with("PAT-"));
        assert!(MedicineId::new().to_string().starts_with("MED-"));
        assert!(ServiceId::new().to_string().starts_with("SER-"));
    }

    #[test]
    fn test_id_parsing_with_and_without_prefix() {
        let original = MedicineId::new_v7();
        let parsed: MedicineId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let bare: MedicineId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, bare);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let patient_id = PatientId::from(uuid);
        let back: Uuid = patient_id.into();
        assert_eq!(uuid, back);
    }
}
