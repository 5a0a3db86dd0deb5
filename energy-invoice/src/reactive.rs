//! Penalty for reactive energy drawn above the allowed ratios.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::{
    input::meter::ConsumptionTotals,
    types::{electricity::Kvarh, money::Money, number::Number},
};

/// Default inductive limit, in percent of active energy.
pub const INDUCTIVE_LIMIT_PERCENT: Decimal = dec!(20);

/// Default capacitive limit, in percent of active energy.
pub const CAPACITIVE_LIMIT_PERCENT: Decimal = dec!(15);

/// The ratio thresholds, in percent. These are policy, not tariff data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReactiveLimits {
    pub inductive_percent: Decimal,
    pub capacitive_percent: Decimal,
}

impl Default for ReactiveLimits {
    fn default() -> Self {
        Self {
            inductive_percent: INDUCTIVE_LIMIT_PERCENT,
            capacitive_percent: CAPACITIVE_LIMIT_PERCENT,
        }
    }
}

/// The outcome of the reactive energy check for one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReactivePenalty {
    /// Inductive energy as a percentage of active energy.
    pub inductive_ratio: Decimal,
    /// Capacitive energy as a percentage of active energy.
    pub capacitive_ratio: Decimal,
    /// The inductive quantity that is billed; either all of it or nothing.
    pub penalized_inductive: Kvarh,
    /// The capacitive quantity that is billed; either all of it or nothing.
    pub penalized_capacitive: Kvarh,
    /// Pre-tax charge.
    pub charge: Money,
}

impl ReactivePenalty {
    #[must_use]
    pub fn none() -> Self {
        Self {
            inductive_ratio: Decimal::ZERO,
            capacitive_ratio: Decimal::ZERO,
            penalized_inductive: Kvarh::zero(),
            penalized_capacitive: Kvarh::zero(),
            charge: Money::zero(),
        }
    }

    #[must_use]
    pub fn is_penalized(&self) -> bool {
        !self.charge.is_zero()
    }
}

/// Compute the reactive penalty for `totals` at `price` per kvarh.
///
/// An axis whose ratio is strictly above its limit is billed for its whole quantity. A ratio
/// exactly at the limit is not penalized. With no active energy both ratios are zero.
#[must_use]
pub fn reactive_penalty(
    totals: &ConsumptionTotals,
    limits: ReactiveLimits,
    price: Money,
) -> ReactivePenalty {
    let inductive_ratio = totals.inductive_kvarh.percent_of(totals.active_kwh);
    let capacitive_ratio = totals.capacitive_kvarh.percent_of(totals.active_kwh);

    let penalized_inductive = penalized(
        totals.inductive_kvarh,
        inductive_ratio,
        limits.inductive_percent,
    );
    let penalized_capacitive = penalized(
        totals.capacitive_kvarh,
        capacitive_ratio,
        limits.capacitive_percent,
    );

    let charge = price * (penalized_inductive + penalized_capacitive);

    ReactivePenalty {
        inductive_ratio: inductive_ratio.into(),
        capacitive_ratio: capacitive_ratio.into(),
        penalized_inductive,
        penalized_capacitive,
        charge,
    }
}

fn penalized(quantity: Kvarh, ratio: Number, limit_percent: Decimal) -> Kvarh {
    if ratio > Number::from(limit_percent) {
        quantity
    } else {
        Kvarh::zero()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{reactive_penalty, ReactiveLimits};
    use crate::{
        input::meter::ConsumptionTotals,
        types::{
            electricity::{Kvarh, Kwh},
            money::Money,
        },
    };

    fn totals(active: Decimal, inductive: Decimal, capacitive: Decimal) -> ConsumptionTotals {
        ConsumptionTotals {
            active_kwh: Kwh::from(active),
            inductive_kvarh: Kvarh::from(inductive),
            capacitive_kvarh: Kvarh::from(capacitive),
        }
    }

    #[test]
    fn ratio_at_the_limit_is_not_penalized() {
        let penalty = reactive_penalty(
            &totals(dec!(1000), dec!(200), dec!(150)),
            ReactiveLimits::default(),
            Money::from(dec!(0.3)),
        );

        assert_eq!(penalty.inductive_ratio, dec!(20));
        assert_eq!(penalty.capacitive_ratio, dec!(15));
        assert_eq!(penalty.charge, Money::zero());
        assert!(!penalty.is_penalized());
    }

    #[test]
    fn ratio_above_the_limit_penalizes_the_whole_axis() {
        let penalty = reactive_penalty(
            &totals(dec!(1000), dec!(200.1), dec!(10)),
            ReactiveLimits::default(),
            Money::from(dec!(0.3)),
        );

        assert_eq!(penalty.penalized_inductive, Kvarh::from(dec!(200.1)));
        assert_eq!(penalty.penalized_capacitive, Kvarh::zero());
        assert_eq!(penalty.charge, Money::from(dec!(60.03)));
    }

    #[test]
    fn both_axes_add_up() {
        let penalty = reactive_penalty(
            &totals(dec!(1000), dec!(250), dec!(160)),
            ReactiveLimits::default(),
            Money::from(dec!(0.5)),
        );

        assert_eq!(penalty.charge, Money::from(dec!(205)));
    }

    #[test]
    fn no_active_energy_means_no_penalty() {
        let penalty = reactive_penalty(
            &totals(dec!(0), dec!(500), dec!(500)),
            ReactiveLimits::default(),
            Money::from(dec!(0.5)),
        );

        assert_eq!(penalty.inductive_ratio, Decimal::ZERO);
        assert_eq!(penalty.charge, Money::zero());
    }

    #[test]
    fn limits_can_be_tightened() {
        let limits = ReactiveLimits {
            inductive_percent: dec!(10),
            capacitive_percent: dec!(15),
        };

        let penalty = reactive_penalty(
            &totals(dec!(1000), dec!(150), dec!(0)),
            limits,
            Money::from(dec!(1)),
        );

        assert_eq!(penalty.charge, Money::from(dec!(150)));
    }
}
