//! Stork fixed-point price decoding.
//!
//! The feed delivers prices as unsigned base-10 integer strings scaled by
//! 10^18 (not necessarily padded by the sender). Decoding uses exact decimal
//! arithmetic rather than an f64 intermediate, so values are preserved
//! digit-for-digit up to `Decimal`'s 96-bit mantissa (raw integers up to
//! roughly 7.9e28); anything larger is rejected as invalid.

use crate::error::{CoreError, Result};
use rust_decimal::Decimal;

const PRICE_SCALE: u32 = 18;

/// Decode a 10^18-scaled integer string into an exact decimal price.
///
/// `"1230000000000000000"` decodes to `1.23`; a short string such as `"5"`
/// decodes to `0.000000000000000005` (the implicit left-padding of the wire
/// format). Fails on empty, signed, non-numeric, or out-of-range input.
pub fn decode_scaled_price(raw: &str) -> Result<Decimal> {
    let units: u128 = raw
        .parse()
        .map_err(|_| CoreError::InvalidPrice(format!("not an unsigned integer: {raw:?}")))?;

    let units = i128::try_from(units)
        .map_err(|_| CoreError::InvalidPrice(format!("price out of range: {raw}")))?;

    Decimal::try_from_i128_with_scale(units, PRICE_SCALE)
        .map(|d| d.normalize())
        .map_err(|_| CoreError::InvalidPrice(format!("price out of range: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_nineteen_digits() {
        assert_eq!(decode_scaled_price("1230000000000000000").unwrap(), dec!(1.23));
    }

    #[test]
    fn test_decode_short_string_pads_left() {
        let price = decode_scaled_price("5").unwrap();
        assert_eq!(price.to_string(), "0.000000000000000005");
    }

    #[test]
    fn test_decode_zero() {
        assert_eq!(decode_scaled_price("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_decode_large_price() {
        // 65123.45 * 10^18
        let price = decode_scaled_price("65123450000000000000000").unwrap();
        assert_eq!(price, dec!(65123.45));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        assert!(decode_scaled_price("12a4").is_err());
        assert!(decode_scaled_price("").is_err());
        assert!(decode_scaled_price("-5").is_err());
        assert!(decode_scaled_price("1.5").is_err());
    }

    #[test]
    fn test_decode_rejects_overflow() {
        // Larger than Decimal's 96-bit mantissa
        let raw = "99999999999999999999999999999999999999";
        assert!(decode_scaled_price(raw).is_err());
    }

    #[test]
    fn test_decode_normalizes_trailing_zeros() {
        let price = decode_scaled_price("50000000000000000000000").unwrap();
        assert_eq!(price.to_string(), "50000");
    }
}
