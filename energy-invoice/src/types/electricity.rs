use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::number::Number;
use crate::Result;

/// A value of kilo watt hours of active energy.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kwh(Number);

impl Kwh {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Convert a float reading, rejecting `NaN` and infinities.
    pub fn from_f64(value: f64) -> Result<Self> {
        Number::from_f64(value, "kWh").map(Self)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Saturating addition
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Scale by a dimensionless contract multiplier.
    #[must_use]
    pub fn scale(self, multiplier: Decimal) -> Self {
        Self(self.0 * Number::from(multiplier))
    }

    /// Round to the display scale.
    #[must_use]
    pub fn with_scale(self) -> Self {
        Self(self.0.with_scale())
    }

    pub(crate) fn non_negative(self, field: &'static str) -> Result<Self> {
        self.0.non_negative(field).map(Self)
    }
}

impl Add for Kwh {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Kwh {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sum for Kwh {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl From<Decimal> for Kwh {
    fn from(value: Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kwh> for Decimal {
    fn from(value: Kwh) -> Self {
        value.0.into()
    }
}

impl From<Kwh> for Number {
    fn from(value: Kwh) -> Self {
        value.0
    }
}

impl Display for Kwh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A value of kilo volt-ampere reactive hours, either inductive or capacitive.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kvarh(Number);

impl Kvarh {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Saturating addition
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// The ratio of this reactive quantity to `active`, in percent.
    ///
    /// Zero when there is no active energy to relate to.
    pub(crate) fn percent_of(self, active: Kwh) -> Number {
        (self.0 * Number::HUNDRED)
            .checked_div(active.0)
            .unwrap_or(Number::ZERO)
    }
}

impl Add for Kvarh {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Kvarh {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl From<Decimal> for Kvarh {
    fn from(value: Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kvarh> for Decimal {
    fn from(value: Kvarh) -> Self {
        value.0.into()
    }
}

impl From<Kvarh> for Number {
    fn from(value: Kvarh) -> Self {
        value.0
    }
}

impl Display for Kvarh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A value of kilo watts.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kw(Number);

impl Kw {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Scale a raw meter reading by the contract's demand multiplier.
    #[must_use]
    pub fn scale(self, multiplier: Decimal) -> Self {
        Self(self.0 * Number::from(multiplier))
    }

    /// The amount by which `self` exceeds `limit`, never below zero.
    #[must_use]
    pub fn excess_over(self, limit: Self) -> Self {
        Self((self.0 - limit.0).max(Number::ZERO))
    }

    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Round to the display scale.
    #[must_use]
    pub fn with_scale(self) -> Self {
        Self(self.0.with_scale())
    }

    pub(crate) fn non_negative(self, field: &'static str) -> Result<Self> {
        self.0.non_negative(field).map(Self)
    }
}

impl From<Decimal> for Kw {
    fn from(value: Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kw> for Decimal {
    fn from(value: Kw) -> Self {
        value.0.into()
    }
}

impl From<Kw> for Number {
    fn from(value: Kw) -> Self {
        value.0
    }
}

impl Display for Kw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
