// crates/pylon-core/src/units.rs
//
// Token amount type and unit constants.
//
// Every token in the protocol uses 18 decimals. All internal accounting is
// integer base units to avoid floating-point error; `TokenAmount` only exists
// for display and for building amounts in tests and scenarios.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::PylonError;

/// Base units of a token. 1 whole token = `UNIT` base units.
pub type Amount = u128;

/// Base units per whole token (10^18).
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Denominator for fees and discounts expressed in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Whole tokens to base units.
pub const fn tokens(whole: u64) -> Amount {
    whole as Amount * UNIT
}

/// A token amount wrapper with human-readable formatting.
///
/// Serializes as a decimal string of whole tokens (`"5.4"`) because TOML and
/// JSON integers cannot carry 18-decimal quantities. Deserializes from such a
/// string or from a plain integer count of whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount {
    /// Amount in base units.
    pub base: Amount,
}

impl TokenAmount {
    /// Create an amount from a fractional whole-token value.
    ///
    /// # Example
    /// ```
    /// use pylon_core::units::TokenAmount;
    /// let amount = TokenAmount::from_decimal(1.5);
    /// assert_eq!(amount.base, 1_500_000_000_000_000_000);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        // Split to keep precision for values above f64's 53-bit mantissa.
        let whole = amount.trunc();
        let frac = amount - whole;
        Self {
            base: whole as Amount * UNIT + (frac * UNIT as f64).round() as Amount,
        }
    }

    pub fn from_base(base: Amount) -> Self {
        Self { base }
    }

    pub fn to_decimal(&self) -> f64 {
        self.base as f64 / UNIT as f64
    }
}

impl FromStr for TokenAmount {
    type Err = PylonError;

    /// Exact parse of a decimal token amount with at most 18 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PylonError::InvalidState(format!("invalid token amount: {:?}", s));
        let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
        let (whole, frac) = match cleaned.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (cleaned.as_str(), ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 18 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: Amount = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: Amount = if frac.is_empty() {
            0
        } else {
            format!("{:0<18}", frac).parse().map_err(|_| invalid())?
        };
        let base = whole
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac))
            .ok_or(PylonError::Overflow)?;
        Ok(Self { base })
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenAmountVisitor;

        impl Visitor<'_> for TokenAmountVisitor {
            type Value = TokenAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal token amount string or whole-token integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenAmount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenAmount, E> {
                Ok(TokenAmount::from_base(tokens(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenAmount, E> {
                u64::try_from(v)
                    .map(|v| TokenAmount::from_base(tokens(v)))
                    .map_err(|_| E::custom("token amount cannot be negative"))
            }
        }

        deserializer.deserialize_any(TokenAmountVisitor)
    }
}

/// Serde adapter for bare `Amount` fields written as token amounts.
///
/// ```ignore
/// #[serde(with = "pylon_core::units::serde_amount")]
/// payout_limit: Amount,
/// ```
pub mod serde_amount {
    use super::{Amount, TokenAmount};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        TokenAmount::from_base(*amount).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        TokenAmount::deserialize(deserializer).map(|t| t.base)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.base / UNIT;
        let frac = self.base % UNIT;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            // Up to 18 decimal places, trailing zeros trimmed.
            let frac_str = format!("{:018}", frac);
            write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(tokens(1), UNIT);
        assert_eq!(tokens(10), 10 * UNIT);
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(TokenAmount::from_decimal(0.05).base, UNIT / 20);
        assert_eq!(TokenAmount::from_decimal(1.5).base, 3 * UNIT / 2);
    }

    #[test]
    fn test_parse_exact() {
        assert_eq!("5.4".parse::<TokenAmount>().unwrap().base, 54 * UNIT / 10);
        assert_eq!("0.05".parse::<TokenAmount>().unwrap().base, UNIT / 20);
        assert_eq!("1_000".parse::<TokenAmount>().unwrap().base, tokens(1_000));
        assert_eq!(".5".parse::<TokenAmount>().unwrap().base, UNIT / 2);
        assert_eq!(
            "0.000000000000000001".parse::<TokenAmount>().unwrap().base,
            1
        );
        assert!("1.0000000000000000001".parse::<TokenAmount>().is_err());
        assert!("abc".parse::<TokenAmount>().is_err());
        assert!("".parse::<TokenAmount>().is_err());
        assert!("-1".parse::<TokenAmount>().is_err());
    }

    #[test]
    fn test_serde_string_and_integer() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            #[serde(with = "serde_amount")]
            amount: Amount,
        }

        let from_str: Holder = serde_json::from_str(r#"{"amount":"2.5"}"#).unwrap();
        assert_eq!(from_str.amount, 5 * UNIT / 2);
        let from_int: Holder = serde_json::from_str(r#"{"amount":3}"#).unwrap();
        assert_eq!(from_int.amount, tokens(3));
        assert_eq!(
            serde_json::to_string(&from_str).unwrap(),
            r#"{"amount":"2.5"}"#
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenAmount::from_base(tokens(42)).to_string(), "42");
        assert_eq!(TokenAmount::from_base(3 * UNIT / 2).to_string(), "1.5");
        assert_eq!(TokenAmount::from_base(0).to_string(), "0");
    }
}
