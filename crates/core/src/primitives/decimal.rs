//! 128-bit decimal floating point values
//!
//! Values use the IEEE 754-2008 binary integer decimal (BID) layout, the
//! same one BSON uses, so payloads are interchangeable with other clients.
//!
//! ## Layout (high 64 bits)
//!
//! ```text
//! bit 63        sign
//! bits 62..49   biased exponent (14 bits, bias 6176)
//! bits 48..0    high bits of the 113-bit coefficient
//! ```
//!
//! When bits 62..61 are both set the combination field is special:
//! `11110` is infinity, `11111` is NaN, anything else is a coefficient
//! larger than `10^34 - 1`, which is non-canonical and reads as zero.
//!
//! ## Equality
//!
//! Equality is by decimal value, not by bit pattern: `1.0` and `1.00` are
//! equal, all zeros are equal, and NaN is never equal to anything.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Raw byte length
pub const DECIMAL128_LEN: usize = 16;

const EXPONENT_BIAS: i32 = 6176;
const EXPONENT_MIN: i32 = -6176;
const EXPONENT_MAX: i32 = 6111;
const MAX_DIGITS: usize = 34;
/// 10^34 - 1
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999;

const SIGN_BIT: u64 = 1 << 63;
const COMBINATION_SPECIAL: u64 = 0b11 << 61;
const INFINITY_BITS: u64 = 0b11110 << 58;
const NAN_BITS: u64 = 0b11111 << 58;
const COEFFICIENT_HIGH_MASK: u64 = (1 << 49) - 1;

/// Decoded form of a decimal128
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parts {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        coefficient: u128,
        exponent: i32,
    },
}

/// IEEE 754-2008 decimal128 value
#[derive(Debug, Clone, Copy)]
pub struct Decimal128 {
    low: u64,
    high: u64,
}

/// Error parsing a decimal string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDecimalError {
    /// Not a decimal number at all
    #[error("'{0}' is not a decimal number")]
    Syntax(String),
    /// More significant digits than decimal128 can hold exactly
    #[error("'{0}' cannot be represented exactly in 34 digits")]
    Inexact(String),
    /// Exponent outside -6176..=6111 after normalization
    #[error("'{0}' exponent is out of range")]
    ExponentOutOfRange(String),
}

impl Decimal128 {
    /// Positive zero with exponent 0
    pub const ZERO: Decimal128 = Decimal128 {
        low: 0,
        high: (EXPONENT_BIAS as u64) << 49,
    };

    /// Quiet NaN
    pub const NAN: Decimal128 = Decimal128 {
        low: 0,
        high: NAN_BITS,
    };

    /// Positive infinity
    pub const INFINITY: Decimal128 = Decimal128 {
        low: 0,
        high: INFINITY_BITS,
    };

    /// Negative infinity
    pub const NEG_INFINITY: Decimal128 = Decimal128 {
        low: 0,
        high: INFINITY_BITS | SIGN_BIT,
    };

    /// Read from the 16-byte little-endian representation
    pub fn from_bytes(bytes: [u8; DECIMAL128_LEN]) -> Self {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&bytes[0..8]);
        high.copy_from_slice(&bytes[8..16]);
        Decimal128 {
            low: u64::from_le_bytes(low),
            high: u64::from_le_bytes(high),
        }
    }

    /// The 16-byte little-endian representation
    pub fn to_bytes(&self) -> [u8; DECIMAL128_LEN] {
        let mut out = [0u8; DECIMAL128_LEN];
        out[0..8].copy_from_slice(&self.low.to_le_bytes());
        out[8..16].copy_from_slice(&self.high.to_le_bytes());
        out
    }

    /// Build a finite value `(-1)^negative * coefficient * 10^exponent`
    ///
    /// Returns `None` when the coefficient has more than 34 digits or the
    /// exponent is out of range.
    pub fn from_parts(negative: bool, coefficient: u128, exponent: i32) -> Option<Self> {
        if coefficient > MAX_COEFFICIENT || !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
            return None;
        }
        let biased = (exponent + EXPONENT_BIAS) as u64;
        let mut high = (biased << 49) | ((coefficient >> 64) as u64 & COEFFICIENT_HIGH_MASK);
        if negative {
            high |= SIGN_BIT;
        }
        Some(Decimal128 {
            low: coefficient as u64,
            high,
        })
    }

    fn parts(&self) -> Parts {
        let negative = self.high & SIGN_BIT != 0;
        if self.high & COMBINATION_SPECIAL == COMBINATION_SPECIAL {
            if self.high & NAN_BITS == NAN_BITS {
                return Parts::NaN;
            }
            if self.high & NAN_BITS == INFINITY_BITS {
                return Parts::Infinity { negative };
            }
            // Second form: implied coefficient exceeds 10^34 - 1, reads as zero.
            let biased = ((self.high >> 47) & 0x3fff) as i32;
            return Parts::Finite {
                negative,
                coefficient: 0,
                exponent: biased - EXPONENT_BIAS,
            };
        }
        let biased = ((self.high >> 49) & 0x3fff) as i32;
        let mut coefficient =
            (((self.high & COEFFICIENT_HIGH_MASK) as u128) << 64) | self.low as u128;
        if coefficient > MAX_COEFFICIENT {
            coefficient = 0;
        }
        Parts::Finite {
            negative,
            coefficient,
            exponent: biased - EXPONENT_BIAS,
        }
    }

    /// Whether this is NaN
    pub fn is_nan(&self) -> bool {
        matches!(self.parts(), Parts::NaN)
    }

    /// Whether this is positive or negative infinity
    pub fn is_infinite(&self) -> bool {
        matches!(self.parts(), Parts::Infinity { .. })
    }

    /// Whether this is a (possibly signed) zero
    pub fn is_zero(&self) -> bool {
        matches!(self.parts(), Parts::Finite { coefficient: 0, .. })
    }

    /// Whether the sign bit is set
    pub fn is_sign_negative(&self) -> bool {
        self.high & SIGN_BIT != 0
    }

    /// Parse a decimal string
    ///
    /// Accepts an optional sign, digits with an optional decimal point, an
    /// optional `e`/`E` exponent, and the case-insensitive words `NaN`,
    /// `Inf` and `Infinity`. Values that would need rounding are rejected.
    pub fn parse_str(s: &str) -> Result<Self, ParseDecimalError> {
        let syntax = || ParseDecimalError::Syntax(s.to_string());

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        if body.eq_ignore_ascii_case("nan") {
            return Ok(Decimal128::NAN);
        }
        if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            return Ok(if negative {
                Decimal128::NEG_INFINITY
            } else {
                Decimal128::INFINITY
            });
        }

        let (mantissa, exp_text) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
            None => (body, None),
        };

        let mut exponent: i64 = match exp_text {
            Some(t) => {
                let digits = t.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(t);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(syntax());
                }
                // Anything this long is far outside the representable range.
                if digits.len() > 9 {
                    return Err(ParseDecimalError::ExponentOutOfRange(s.to_string()));
                }
                t.parse::<i64>().map_err(|_| syntax())?
            }
            None => 0,
        };

        let mut digits = String::with_capacity(mantissa.len());
        let mut seen_point = false;
        let mut seen_digit = false;
        for c in mantissa.chars() {
            match c {
                '0'..='9' => {
                    seen_digit = true;
                    digits.push(c);
                    if seen_point {
                        exponent -= 1;
                    }
                }
                '.' if !seen_point => seen_point = true,
                _ => return Err(syntax()),
            }
        }
        if !seen_digit {
            return Err(syntax());
        }

        let mut significant = digits.trim_start_matches('0').to_string();

        if significant.is_empty() {
            // Zero keeps its exponent, clamped into range.
            let exponent = exponent.clamp(EXPONENT_MIN as i64, EXPONENT_MAX as i64) as i32;
            return Decimal128::from_parts(negative, 0, exponent).ok_or_else(syntax);
        }

        // Drop trailing zeros we cannot store, keeping the value exact.
        while significant.len() > MAX_DIGITS && significant.ends_with('0') {
            significant.pop();
            exponent += 1;
        }
        if significant.len() > MAX_DIGITS {
            return Err(ParseDecimalError::Inexact(s.to_string()));
        }
        while exponent < EXPONENT_MIN as i64 && significant.ends_with('0') {
            significant.pop();
            exponent += 1;
        }
        if exponent < EXPONENT_MIN as i64 {
            return Err(ParseDecimalError::Inexact(s.to_string()));
        }
        // Clamp large exponents by padding the coefficient with zeros.
        while exponent > EXPONENT_MAX as i64 && significant.len() < MAX_DIGITS {
            significant.push('0');
            exponent -= 1;
        }
        if exponent > EXPONENT_MAX as i64 {
            return Err(ParseDecimalError::ExponentOutOfRange(s.to_string()));
        }

        let coefficient: u128 = significant.parse().map_err(|_| syntax())?;
        Decimal128::from_parts(negative, coefficient, exponent as i32).ok_or_else(syntax)
    }

    /// Value with trailing zeros of the coefficient folded into the exponent
    fn normalized(&self) -> Parts {
        match self.parts() {
            Parts::Finite {
                coefficient: 0, ..
            } => Parts::Finite {
                negative: false,
                coefficient: 0,
                exponent: 0,
            },
            Parts::Finite {
                negative,
                mut coefficient,
                mut exponent,
            } => {
                while coefficient % 10 == 0 {
                    coefficient /= 10;
                    exponent += 1;
                }
                Parts::Finite {
                    negative,
                    coefficient,
                    exponent,
                }
            }
            other => other,
        }
    }
}

impl PartialEq for Decimal128 {
    fn eq(&self, other: &Self) -> bool {
        match (self.normalized(), other.normalized()) {
            (Parts::NaN, _) | (_, Parts::NaN) => false,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Decimal128 {
    /// Canonical scientific string, matching other BSON clients
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, coefficient, exponent) = match self.parts() {
            Parts::NaN => return f.write_str("NaN"),
            Parts::Infinity { negative } => {
                return f.write_str(if negative { "-Infinity" } else { "Infinity" })
            }
            Parts::Finite {
                negative,
                coefficient,
                exponent,
            } => (negative, coefficient, exponent),
        };

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        let digits = coefficient.to_string();
        let scientific_exponent = digits.len() as i32 - 1 + exponent;

        if exponent > 0 || scientific_exponent < -6 {
            out.push_str(&digits[..1]);
            if digits.len() > 1 {
                out.push('.');
                out.push_str(&digits[1..]);
            }
            out.push('E');
            if scientific_exponent >= 0 {
                out.push('+');
            }
            out.push_str(&scientific_exponent.to_string());
        } else if exponent == 0 {
            out.push_str(&digits);
        } else {
            let radix = digits.len() as i32 + exponent;
            if radix > 0 {
                let (int_part, frac_part) = digits.split_at(radix as usize);
                out.push_str(int_part);
                out.push('.');
                out.push_str(frac_part);
            } else {
                out.push_str("0.");
                for _ in 0..(-radix) {
                    out.push('0');
                }
                out.push_str(&digits);
            }
        }
        f.write_str(&out)
    }
}

impl FromStr for Decimal128 {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal128::parse_str(s)
    }
}

impl From<i64> for Decimal128 {
    fn from(v: i64) -> Self {
        Decimal128::from_parts(v < 0, v.unsigned_abs() as u128, 0).unwrap_or(Decimal128::NAN)
    }
}

impl Serialize for Decimal128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal128 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Decimal128::parse_str(&s).map_err(serde::de::Error::custom)
    }
}
