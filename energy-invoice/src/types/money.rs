use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    electricity::{Kvarh, Kw, Kwh},
    number::Number,
};
use crate::Result;

/// A signed monetary amount in TL. Also used for per-unit prices (TL/kWh, TL/kW, TL/kvarh).
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Money(Number);

impl Money {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Convert a float amount, rejecting `NaN` and infinities.
    pub fn from_f64(value: f64) -> Result<Self> {
        Number::from_f64(value, "amount").map(Self)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_negative()
    }

    /// Round to two decimals, half away from zero.
    #[must_use]
    pub fn with_scale(self) -> Self {
        Self(self.0.with_scale())
    }

    /// Multiply by a dimensionless factor such as the contract multiplier.
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Self {
        Self(self.0 * Number::from(factor))
    }

    /// The average price obtained by spreading this amount over `energy`.
    ///
    /// `None` when there is no energy to spread over.
    #[must_use]
    pub fn per_kwh(self, energy: Kwh) -> Option<Self> {
        self.0.checked_div(Number::from(energy)).map(Self)
    }

    pub(crate) fn non_negative(self, field: &'static str) -> Result<Self> {
        self.0.non_negative(field).map(Self)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0 + rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl Mul<Kwh> for Money {
    type Output = Money;

    fn mul(self, rhs: Kwh) -> Self::Output {
        Self(self.0 * Number::from(rhs))
    }
}

impl Mul<Money> for Kwh {
    type Output = Money;

    fn mul(self, rhs: Money) -> Self::Output {
        rhs * self
    }
}

impl Mul<Kvarh> for Money {
    type Output = Money;

    fn mul(self, rhs: Kvarh) -> Self::Output {
        Self(self.0 * Number::from(rhs))
    }
}

impl Mul<Kw> for Money {
    type Output = Money;

    fn mul(self, rhs: Kw) -> Self::Output {
        Self(self.0 * Number::from(rhs))
    }
}

impl Mul<Money> for Kw {
    type Output = Money;

    fn mul(self, rhs: Money) -> Self::Output {
        rhs * self
    }
}

impl Mul<Rate> for Money {
    type Output = Money;

    fn mul(self, rhs: Rate) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0.into()
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A tax or surcharge rate, expressed as a fraction (`0.20` is twenty percent).
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Rate(Number);

impl Rate {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// `amount × (1 + rate)`.
    #[must_use]
    pub fn gross_up(self, amount: Money) -> Money {
        Money(amount.0 * (Number::ONE + self.0))
    }

    /// Rates above one were most likely entered as a percentage.
    pub(crate) fn exceeds_one(self) -> bool {
        self.0 > Number::ONE
    }

    pub(crate) fn non_negative(self, field: &'static str) -> Result<Self> {
        self.0.non_negative(field).map(Self)
    }
}

impl From<Decimal> for Rate {
    fn from(value: Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Rate> for Decimal {
    fn from(value: Rate) -> Self {
        value.0.into()
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0 * Number::HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{Money, Rate};
    use crate::{types::electricity::Kwh, Error};

    #[test]
    fn float_amounts_must_be_finite() {
        assert!(matches!(Money::from_f64(f64::NAN), Err(Error::InvalidNumber("amount"))));
        assert!(matches!(Kwh::from_f64(f64::INFINITY), Err(Error::InvalidNumber("kWh"))));
        assert_eq!(Money::from_f64(12.5).ok(), Some(Money::from(dec!(12.5))));
    }

    #[test]
    fn gross_up_applies_rate_on_top() {
        let vat = Rate::from(dec!(0.20));
        assert_eq!(vat.gross_up(Money::from(dec!(30250))), Money::from(dec!(36300)));
    }

    #[test]
    fn average_price_needs_energy() {
        let cost = Money::from(dec!(5000));
        assert_eq!(cost.per_kwh(Kwh::zero()), None);
        assert_eq!(
            cost.per_kwh(Kwh::from(dec!(2000))),
            Some(Money::from(dec!(2.5)))
        );
    }

    #[test]
    fn rate_displays_as_percentage() {
        assert_eq!(Rate::from(dec!(0.2)).to_string(), "20.00%");
    }
}
