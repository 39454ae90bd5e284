// crates/pylon-core/src/math.rs
//
// Fixed-point helpers. Products of two 18-decimal quantities routinely exceed
// 128 bits, so `mul_div` widens to arbitrary precision before dividing.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::PylonError;
use crate::units::{Amount, BPS_DENOMINATOR};

/// `floor(a * b / denominator)`.
///
/// # Errors
/// `InvalidState` on a zero denominator, `Overflow` if the quotient does not
/// fit in 128 bits.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, PylonError> {
    if denominator == 0 {
        return Err(PylonError::InvalidState("division by zero".to_string()));
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }
    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(denominator);
    wide.to_u128().ok_or(PylonError::Overflow)
}

/// `ceil(a * b / denominator)`.
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> Result<u128, PylonError> {
    let down = mul_div(a, b, denominator)?;
    let exact = BigUint::from(down) * BigUint::from(denominator)
        == BigUint::from(a) * BigUint::from(b);
    if exact {
        Ok(down)
    } else {
        down.checked_add(1).ok_or(PylonError::Overflow)
    }
}

/// `amount * bps / 10_000`, rounded down.
pub fn apply_bps(amount: Amount, bps: u32) -> Result<Amount, PylonError> {
    mul_div(amount, bps as u128, BPS_DENOMINATOR)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, PylonError> {
    a.checked_add(b).ok_or(PylonError::Overflow)
}

pub fn checked_sub(a: u128, b: u128) -> Result<u128, PylonError> {
    a.checked_sub(b).ok_or(PylonError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UNIT;

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 10^24 * 10^21 overflows u128 but the quotient fits.
        let a = 1_000_000 * UNIT;
        let b = 1_000 * UNIT;
        assert_eq!(mul_div(a, b, UNIT).unwrap(), 1_000_000_000 * UNIT);
    }

    #[test]
    fn test_mul_div_overflowing_quotient() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(PylonError::Overflow));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(matches!(mul_div(1, 1, 0), Err(PylonError::InvalidState(_))));
    }

    #[test]
    fn test_mul_div_up() {
        assert_eq!(mul_div_up(10, 3, 4).unwrap(), 8);
        assert_eq!(mul_div_up(8, 3, 4).unwrap(), 6);
    }

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(6 * UNIT, 1000).unwrap(), 6 * UNIT / 10);
        assert_eq!(apply_bps(6 * UNIT, 0).unwrap(), 0);
    }
}
