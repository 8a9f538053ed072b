//! Settlement arithmetic.
//!
//! All monetary math runs on [`rust_decimal::Decimal`]; binary floats never
//! touch an amount. Rounding happens only at presentation boundaries via
//! [`round_display`], never mid-calculation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Change due back to the customer: `max(received - total, 0)`.
pub fn balance(received: Decimal, total: Decimal) -> Decimal {
    (received - total).max(Decimal::ZERO)
}

/// Ceiling for further refunds: `total - refunded`.
pub fn remaining_refundable(total: Decimal, refunded: Decimal) -> Decimal {
    total - refunded
}

/// Round-half-up to two fraction digits for display.
pub fn round_display(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balance_is_change_due() {
        assert_eq!(balance(dec!(60.00), dec!(55.00)), dec!(5.00));
        assert_eq!(balance(dec!(100), dec!(100)), dec!(0));
    }

    #[test]
    fn balance_never_goes_negative() {
        // Underpayment is not change owed
        assert_eq!(balance(dec!(40.00), dec!(55.00)), dec!(0));
        assert_eq!(balance(dec!(0), dec!(0.01)), dec!(0));
    }

    #[test]
    fn remaining_refundable_tracks_cumulative_refunds() {
        assert_eq!(remaining_refundable(dec!(500.00), dec!(0)), dec!(500.00));
        assert_eq!(remaining_refundable(dec!(500.00), dec!(150.50)), dec!(349.50));
        assert_eq!(remaining_refundable(dec!(500.00), dec!(500.00)), dec!(0.00));
    }

    #[test]
    fn cent_level_amounts_stay_exact() {
        // 0.1 + 0.2 style drift must not exist in decimal space
        let total = dec!(0.30);
        let refunded = dec!(0.10) + dec!(0.20);
        assert_eq!(remaining_refundable(total, refunded), dec!(0.00));
    }

    #[test]
    fn display_rounding_is_half_up_at_two_places() {
        assert_eq!(round_display(dec!(2.345)), dec!(2.35));
        assert_eq!(round_display(dec!(2.344)), dec!(2.34));
        assert_eq!(round_display(dec!(5)), dec!(5.00));
    }
}
