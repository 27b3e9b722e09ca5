//! Integer conversion of Kubernetes resource quantities.
//!
//! A quantity converts only when its value is an exact integer that fits in
//! `i64`: `2`, `1k`, `4Ki`, `2000m` and `3e2` convert, `1500m` and `0.5` do
//! not.
//!
//! ```text
//! quantity ::= sign? number suffix
//! number   ::= digits | digits "." digits? | "." digits
//! suffix   ::= "" | binary | decimal | ("e" | "E") sign? digits
//! binary   ::= Ki | Mi | Gi | Ti | Pi | Ei
//! decimal  ::= n | u | m | k | M | G | T | P | E
//! ```

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::error::{TopologyError, TopologyResult};

/// Scaling applied by a quantity suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    /// Multiply by `1024^n`.
    Binary(u32),
    /// Multiply by `10^n`.
    Decimal(i32),
}

/// Convert a quantity to an integer.
pub fn quantity_as_i64(quantity: &Quantity) -> TopologyResult<i64> {
    parse_quantity_i64(&quantity.0)
}

/// Convert a quantity string to an integer.
pub fn parse_quantity_i64(value: &str) -> TopologyResult<i64> {
    let invalid = |reason: &str| TopologyError::InvalidQuantity {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        Some(_) => (false, value),
        None => return Err(invalid("empty quantity")),
    };

    let number_len = unsigned
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("missing digits"));
    }
    if fraction.contains('.') {
        return Err(invalid("more than one decimal point"));
    }

    let scale = parse_suffix(suffix).ok_or_else(|| invalid("unknown suffix"))?;

    let digits: String = whole.chars().chain(fraction.chars()).collect();
    let digits = digits.trim_start_matches('0');
    let non_integral = || TopologyError::NonIntegralQuantity(value.to_string());

    if digits.is_empty() {
        return Ok(0);
    }
    let mantissa: i128 = digits.parse().map_err(|_| non_integral())?;

    let fraction_len = i32::try_from(fraction.len()).map_err(|_| non_integral())?;
    let (binary_exp, decimal_exp) = match scale {
        Scale::Binary(n) => (n * 10, -fraction_len),
        Scale::Decimal(n) => (0, n.checked_sub(fraction_len).ok_or_else(non_integral)?),
    };

    let mut numerator = mantissa
        .checked_mul(pow_i128(2, binary_exp).ok_or_else(non_integral)?)
        .ok_or_else(non_integral)?;
    let mut denominator: i128 = 1;
    if decimal_exp >= 0 {
        let factor = pow_i128(10, decimal_exp.unsigned_abs()).ok_or_else(non_integral)?;
        numerator = numerator.checked_mul(factor).ok_or_else(non_integral)?;
    } else {
        // A denominator beyond i128 can never divide a non-zero mantissa.
        denominator = pow_i128(10, decimal_exp.unsigned_abs()).ok_or_else(non_integral)?;
    }

    if numerator % denominator != 0 {
        return Err(non_integral());
    }

    let magnitude = numerator / denominator;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| non_integral())
}

fn parse_suffix(suffix: &str) -> Option<Scale> {
    let scale = match suffix {
        "" => Scale::Decimal(0),
        "Ki" => Scale::Binary(1),
        "Mi" => Scale::Binary(2),
        "Gi" => Scale::Binary(3),
        "Ti" => Scale::Binary(4),
        "Pi" => Scale::Binary(5),
        "Ei" => Scale::Binary(6),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let unsigned = exponent
                .strip_prefix('+')
                .or_else(|| exponent.strip_prefix('-'))
                .unwrap_or(exponent);
            if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Scale::Decimal(exponent.parse().ok()?)
        }
    };

    Some(scale)
}

fn pow_i128(base: i128, exp: u32) -> Option<i128> {
    base.checked_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0)]
    #[case("2", 2)]
    #[case("+7", 7)]
    #[case("-3", -3)]
    #[case("1k", 1_000)]
    #[case("4Ki", 4_096)]
    #[case("1Gi", 1_073_741_824)]
    #[case("2000m", 2)]
    #[case("1.5k", 1_500)]
    #[case("3e2", 300)]
    #[case("5E+1", 50)]
    #[case("0.000m", 0)]
    #[case("007", 7)]
    #[case("1.", 1)]
    fn test_integral_quantities(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(parse_quantity_i64(input), Ok(expected));
    }

    #[rstest]
    #[case("1500m")]
    #[case("0.5")]
    #[case("1e-1")]
    #[case("1u")]
    #[case("10E")]
    #[case("9Ei")]
    #[case("1e40")]
    fn test_non_integral_quantities(#[case] input: &str) {
        assert!(matches!(
            parse_quantity_i64(input),
            Err(TopologyError::NonIntegralQuantity(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1x")]
    #[case(".")]
    #[case("1.2.3")]
    #[case("1e")]
    #[case("1 Gi")]
    fn test_invalid_quantities(#[case] input: &str) {
        let err = parse_quantity_i64(input).unwrap_err();
        assert!(err.is_quantity_error());
        assert!(matches!(err, TopologyError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_quantity_wrapper() {
        assert_eq!(quantity_as_i64(&Quantity("8".to_string())), Ok(8));
    }
}
