use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-indexed period within a generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period(pub u32);

/// Non-negative monetary amount in cents.
///
/// Integer cents keep the allocation split and ledger totals exact.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    /// Whole units, e.g. `Money::from_units(10_000)` is 10 000.00.
    pub const fn from_units(units: u64) -> Self {
        Money(units * 100)
    }

    /// Convert a major-unit float (e.g. 509.96) to cents, rounding half away from zero.
    pub fn from_major(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteAmount(value));
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeAmount(value));
        }
        let cents = (value * 100.0).round();
        // `u64::MAX as f64` is 2^64, the first value a cast would saturate on.
        if cents >= u64::MAX as f64 {
            return Err(ValidationError::AmountOutOfRange(value));
        }
        Ok(Money(cents as u64))
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// `self × factor`, rounded to the nearest cent. Negative products floor at zero.
    pub fn scale(self, factor: f64) -> Money {
        let scaled = (self.0 as f64 * factor).round();
        if scaled <= 0.0 { Money::ZERO } else { Money(scaled as u64) }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}.{:02}", self.0 / 100, self.0 % 100))
    }
}
