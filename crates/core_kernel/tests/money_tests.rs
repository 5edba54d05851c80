//! Unit tests for the Money module
//!
//! Tests cover money creation, checked arithmetic, currency handling,
//! and the percentage helper used by dashboard breakdowns.

use core_kernel::{Money, Currency, MoneyError, percentage_floor, MAX_AMOUNT};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::INR);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_handles_jpy_no_decimals() {
        let m = Money::from_minor(10000, Currency::JPY);
        assert_eq!(m.amount(), dec!(10000));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert!(!m.is_negative());
        assert!(!m.is_positive());
    }

    #[test]
    fn test_default_currency_is_inr() {
        assert_eq!(Currency::default(), Currency::INR);
    }

    #[test]
    fn test_currency_from_str_is_case_insensitive() {
        assert_eq!("inr".parse::<Currency>(), Ok(Currency::INR));
        assert_eq!(
            "XXX".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency("XXX".to_string()))
        );
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_and_sub() {
        let a = Money::new(dec!(500), Currency::INR);
        let b = Money::new(dec!(120.50), Currency::INR);

        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(620.50));
        assert_eq!(a.checked_sub(&b).unwrap().amount(), dec!(379.50));
    }

    #[test]
    fn test_times_and_checked_mul() {
        let unit = Money::new(dec!(50), Currency::INR);
        assert_eq!(unit.times(2).unwrap().amount(), dec!(100));
        assert_eq!(unit.checked_mul(dec!(1.5)).unwrap().amount(), dec!(75));
    }

    #[test]
    fn test_largest_price_times_largest_quantity_stays_finite() {
        let unit = Money::new(MAX_AMOUNT, Currency::INR);
        let line = unit.times(u32::MAX).unwrap();
        assert!(matches!(line.within_limit(), Err(MoneyError::Overflow(_))));
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let items = [
            Money::new(dec!(1), Currency::INR),
            Money::new(dec!(1), Currency::USD),
        ];
        let result = Money::sum(items.iter(), Currency::INR);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(10.005), Currency::INR);
        assert_eq!(m.round_to_currency().amount(), dec!(10.00));
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_uses_symbol_and_minor_units() {
        let m = Money::new(dec!(900), Currency::INR);
        assert_eq!(m.to_string(), "₹ 900.00");
    }
}

#[test]
fn test_breakdown_percentages_floor() {
    // 500 / 100 / 300 of 900
    assert_eq!(percentage_floor(dec!(500), dec!(900)), 55);
    assert_eq!(percentage_floor(dec!(100), dec!(900)), 11);
    assert_eq!(percentage_floor(dec!(300), dec!(900)), 33);
}
