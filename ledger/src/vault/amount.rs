//! # Fixed-Point Point Amounts
//!
//! Balances are `u64` counts of the smallest unit (hundredths of a point).
//! No floating point in arithmetic, ever. `f64` only shows up at the edges:
//! the persisted record stores balances as JSON numbers, and callers may hand
//! us a float they parsed from somewhere.
//!
//! Amounts are capped at [`Amount::MAX`]. Below that cap every amount has at
//! most fifteen significant digits, so `units / 100` as an `f64` prints back
//! as exactly the decimal it came from, and [`Amount::from_f64`] reads that
//! decimal instead of multiplying floats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{AMOUNT_DECIMALS, AMOUNT_MAX_UNITS, AMOUNT_SCALE};

/// Reasons a value cannot become an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// NaN or an infinity.
    #[error("amount must be a finite number")]
    NonFinite,

    /// Below zero.
    #[error("amount must not be negative")]
    Negative,

    /// Zero where a positive amount is required.
    #[error("amount must be positive")]
    Zero,

    /// More decimal places than the ledger tracks.
    #[error("amount has more than {} decimal places", AMOUNT_DECIMALS)]
    TooPrecise,

    /// Larger than [`Amount::MAX`].
    #[error("amount is too large")]
    Overflow,

    /// Not a number at all.
    #[error("malformed amount '{0}'")]
    Malformed(String),
}

/// A non-negative quantity of points, stored in hundredths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    /// Nothing at all.
    pub const ZERO: Amount = Amount(0);

    /// The largest amount a balance may hold.
    pub const MAX: Amount = Amount(AMOUNT_MAX_UNITS);

    /// Builds an amount from smallest units. Callers keep `units` at or
    /// below [`Amount::MAX`]; arithmetic never produces more.
    pub const fn from_units(units: u64) -> Self {
        Amount(units)
    }

    /// Builds an amount from whole points. `u32` input stays below the cap.
    pub const fn from_points(points: u32) -> Self {
        Amount(points as u64 * AMOUNT_SCALE)
    }

    /// Converts a float exactly, rejecting NaN, infinities, negatives,
    /// sub-unit precision and anything above [`Amount::MAX`].
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        Self::check_float(value)?;
        if value == 0.0 {
            return Ok(Amount::ZERO);
        }
        // `Display` prints the shortest decimal that reads back as `value`,
        // never in exponent form.
        value.to_string().parse()
    }

    /// Like [`Amount::from_f64`], but rounds a third decimal to the nearest
    /// unit instead of refusing it. Returns the amount and whether rounding
    /// happened.
    pub fn from_f64_rounded(value: f64) -> Result<(Self, bool), AmountError> {
        match Self::from_f64(value) {
            Ok(amount) => Ok((amount, false)),
            Err(AmountError::TooPrecise) => {
                let units = (value * AMOUNT_SCALE as f64).round();
                if units > AMOUNT_MAX_UNITS as f64 {
                    return Err(AmountError::Overflow);
                }
                Ok((Amount(units as u64), true))
            }
            Err(err) => Err(err),
        }
    }

    fn check_float(value: f64) -> Result<(), AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NonFinite);
        }
        if value < 0.0 {
            return Err(AmountError::Negative);
        }
        Ok(())
    }

    /// Returns the raw unit count.
    pub const fn units(self) -> u64 {
        self.0
    }

    /// Float view for the persisted record. [`Amount::from_f64`] maps it
    /// back to the same units.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / AMOUNT_SCALE as f64
    }

    /// Returns `true` if this amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Rejects zero; used wherever an operation needs something to move.
    pub fn ensure_positive(self) -> Result<Self, AmountError> {
        if self.is_zero() {
            Err(AmountError::Zero)
        } else {
            Ok(self)
        }
    }

    /// `None` if the sum would pass [`Amount::MAX`].
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0
            .checked_add(rhs.0)
            .filter(|&units| units <= AMOUNT_MAX_UNITS)
            .map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0).min(AMOUNT_MAX_UNITS))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!(
            "{}.{:0width$}",
            self.0 / AMOUNT_SCALE,
            self.0 % AMOUNT_SCALE,
            width = AMOUNT_DECIMALS as usize
        ))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a plain decimal (`"40"`, `"40.5"`, `"+0.25"`) without going
    /// through `f64`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative);
        }
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return match body.to_ascii_lowercase().as_str() {
                "inf" | "infinity" | "nan" => Err(AmountError::NonFinite),
                _ => Err(AmountError::Malformed(s.to_string())),
            };
        }

        let frac = frac.trim_end_matches('0');
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(AmountError::TooPrecise);
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u64>().map_err(|_| AmountError::Overflow)?
        };
        let mut frac_units = 0u64;
        for (i, digit) in frac.bytes().enumerate() {
            let place = 10u64.pow(AMOUNT_DECIMALS - 1 - i as u32);
            frac_units += u64::from(digit - b'0') * place;
        }

        whole_units
            .checked_mul(AMOUNT_SCALE)
            .and_then(|units| units.checked_add(frac_units))
            .filter(|&units| units <= AMOUNT_MAX_UNITS)
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::from_f64(value)
    }
}

// The record keeps balances as plain JSON numbers so older files stay
// readable.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Amount::from_f64(raw).map_err(serde::de::Error::custom)
    }
}
