//! Contracted power charges of dual-rate contracts.

use serde::Serialize;

use crate::types::{electricity::Kw, money::Money};

/// The power charges of one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PowerCharges {
    pub contracted_kw: Kw,
    /// Finalized peak demand after the demand multiplier, zero when it is missing.
    pub peak_demand_kw: Kw,
    pub excess_kw: Kw,
    /// Power price times contracted power.
    pub base_charge: Money,
    /// Overage price times the demand above contracted power.
    pub excess_charge: Money,
    /// No finalized demand record was available; the excess is therefore zero.
    pub demand_missing: bool,
}

impl PowerCharges {
    /// Charges of a single-rate contract.
    #[must_use]
    pub fn none() -> Self {
        Self {
            contracted_kw: Kw::zero(),
            peak_demand_kw: Kw::zero(),
            excess_kw: Kw::zero(),
            base_charge: Money::zero(),
            excess_charge: Money::zero(),
            demand_missing: false,
        }
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.base_charge + self.excess_charge
    }
}

/// Compute the power charges for a dual-rate contract.
///
/// The base charge is due whether or not the contracted power was reached. Without a finalized
/// `peak_demand` no excess is charged and the result is flagged so the caller can say so.
#[must_use]
pub fn power_charges(
    contracted_kw: Kw,
    peak_demand: Option<Kw>,
    power_price: Money,
    overage_price: Money,
) -> PowerCharges {
    let demand_missing = peak_demand.is_none();
    let peak_demand_kw = peak_demand.unwrap_or_else(Kw::zero);
    let excess_kw = peak_demand_kw.excess_over(contracted_kw);

    if demand_missing {
        tracing::warn!(%contracted_kw, "no finalized demand record, excess charge assumed zero");
    }

    PowerCharges {
        contracted_kw,
        peak_demand_kw,
        excess_kw,
        base_charge: power_price * contracted_kw,
        excess_charge: overage_price * excess_kw,
        demand_missing,
    }
}
