//! Currency acceptance rules.

use rust_decimal::Decimal;

use crate::error::AppError;

/// The single currency intake accepts, with its minor-unit scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyPolicy {
    code: &'static str,
    minor_units: u32,
}

impl CurrencyPolicy {
    /// US dollars, two decimal places.
    pub const USD: CurrencyPolicy = CurrencyPolicy {
        code: "USD",
        minor_units: 2,
    };

    /// The smallest acceptable amount: one minor unit.
    pub fn minimum(&self) -> Decimal {
        Decimal::new(1, self.minor_units)
    }

    /// Validates currency code, precision and minimum, in that order.
    ///
    /// Trailing zeros do not count as precision: `10.010` is two places.
    pub fn validate(&self, currency: &str, amount: Decimal) -> Result<(), AppError> {
        if currency != self.code {
            return Err(AppError::Validation(format!(
                "only {} transactions supported",
                self.code
            )));
        }

        if amount.normalize().scale() > self.minor_units {
            return Err(AppError::Validation(format!(
                "{} amounts cannot have more than {} decimal places",
                self.code, self.minor_units
            )));
        }

        if amount < self.minimum() {
            return Err(AppError::Validation(format!(
                "minimum transaction amount is {} {}",
                self.minimum(),
                self.code
            )));
        }

        Ok(())
    }
}

impl Default for CurrencyPolicy {
    fn default() -> Self {
        Self::USD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn check(amount: Decimal) -> Result<(), AppError> {
        CurrencyPolicy::USD.validate("USD", amount)
    }

    #[test]
    fn test_accepts_one_cent() {
        assert!(check(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_accepts_whole_and_two_place_amounts() {
        assert!(check(Decimal::new(25, 0)).is_ok());
        assert!(check(Decimal::new(2500, 2)).is_ok());
    }

    #[test]
    fn test_trailing_zero_is_not_extra_precision() {
        assert!(check(Decimal::new(10010, 3)).is_ok());
    }

    #[test]
    fn test_rejects_excess_precision() {
        let err = check(Decimal::new(10005, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("decimal places"));
    }

    #[test]
    fn test_rejects_zero_as_below_minimum() {
        let err = check(Decimal::new(0, 2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("minimum"));
    }

    #[test]
    fn test_rejects_half_cent() {
        let err = check(Decimal::new(5, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_rejects_other_currency_first() {
        // Currency is reported even when the amount is also invalid.
        let err = CurrencyPolicy::USD
            .validate("EUR", Decimal::new(5, 3))
            .unwrap_err();
        assert!(err.to_string().contains("only USD"));
    }

    #[test]
    fn test_currency_code_is_case_sensitive() {
        assert!(CurrencyPolicy::USD.validate("usd", Decimal::ONE).is_err());
    }
}
