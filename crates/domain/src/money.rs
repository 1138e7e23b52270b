// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Monetary value objects.
//!
//! Amounts and rates wrap `rust_decimal::Decimal` so that no floating point
//! arithmetic ever touches money. Both are persisted as their normalized
//! string form.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// Decimal places kept for amounts and allocations.
const MONEY_SCALE: u32 = 2;

/// Decimal places allowed for a rate.
const RATE_SCALE: u32 = 4;

/// Largest accepted amount, `1_000_000_000_000_000`.
///
/// Keeps every allocation and report total far inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// A strictly positive donation amount with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not positive, exceeds
    /// [`MAX_AMOUNT`], or has more than two decimal places.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(String::from(
                "Amount must be greater than zero",
            )));
        }
        if value > MAX_AMOUNT {
            return Err(DomainError::InvalidAmount(format!(
                "Amount {value} exceeds the maximum of {MAX_AMOUNT}"
            )));
        }
        let normalized: Decimal = value.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(DomainError::InvalidAmount(format!(
                "Amount {value} has more than {MONEY_SCALE} decimal places"
            )));
        }
        Ok(Self(normalized))
    }

    /// Parses an amount from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a decimal or violates [`Amount::new`].
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let decimal: Decimal = Decimal::from_str(value.trim())
            .map_err(|e| DomainError::InvalidAmount(format!("'{value}': {e}")))?;
        Self::new(decimal)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An allocation rate expressed as a percentage in `[0, 100]`.
///
/// The allocation of a transaction is the share of its amount reserved for
/// program operations, computed as `amount * rate / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    /// The zero rate.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, above 100, or has more than
    /// four decimal places.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvalidRate(format!(
                "Rate {value} must be between 0 and 100"
            )));
        }
        let normalized: Decimal = value.normalize();
        if normalized.scale() > RATE_SCALE {
            return Err(DomainError::InvalidRate(format!(
                "Rate {value} has more than {RATE_SCALE} decimal places"
            )));
        }
        Ok(Self(normalized))
    }

    /// Parses a rate from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a decimal or violates [`Rate::new`].
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let decimal: Decimal = Decimal::from_str(value.trim())
            .map_err(|e| DomainError::InvalidRate(format!("'{value}': {e}")))?;
        Self::new(decimal)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Computes the allocation for an amount at this rate.
    ///
    /// Rounded half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the product leaves `Decimal` range.
    pub fn allocation_for(&self, amount: Amount) -> Result<Decimal, DomainError> {
        let allocation: Decimal = amount
            .value()
            .checked_mul(self.0)
            .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| {
                DomainError::ArithmeticOverflow(format!("allocation of {amount} at rate {self}"))
            })?;
        Ok(allocation
            .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
            .normalize())
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
