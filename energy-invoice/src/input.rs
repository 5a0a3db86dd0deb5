//! The plain data the engine consumes. Fetching and storing it is up to the caller.

use serde::{Deserialize, Serialize};

use crate::{
    types::{electricity::Kw, time::BillingPeriod},
    Result,
};

/// Contract settings and tariff classification.
pub mod contract;

/// Wholesale prices and renewable surcharge values.
pub mod market;

/// Hourly meter readings and peak demand records.
pub mod meter;

/// Rows of the published tariff table.
pub mod tariff;

use contract::ContractSettings;
use market::{HourlyPrice, SurchargeRecord};
use meter::{DemandRecord, HourlyConsumption};

/// Everything needed to bill one contract.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BillingInput {
    pub contract: ContractSettings,

    /// Hourly readings covering at least the billed period and the one before it.
    #[serde(default)]
    pub consumption: Vec<HourlyConsumption>,

    /// Hourly wholesale prices, possibly with gaps.
    #[serde(alias = "ptf", default)]
    pub wholesale_prices: Vec<HourlyPrice>,

    #[serde(alias = "yekdem", default)]
    pub surcharges: Vec<SurchargeRecord>,

    #[serde(default)]
    pub demand: Vec<DemandRecord>,
}

impl BillingInput {
    pub fn new(contract: ContractSettings) -> Self {
        Self {
            contract,
            consumption: Vec::new(),
            wholesale_prices: Vec::new(),
            surcharges: Vec::new(),
            demand: Vec::new(),
        }
    }

    /// The surcharge record of `period`. When the source holds several, the last one wins.
    #[must_use]
    pub fn surcharge(&self, period: BillingPeriod) -> Option<&SurchargeRecord> {
        self.surcharges
            .iter()
            .rev()
            .find(|record| record.period == period)
    }

    /// The finalized peak demand of `period`, scaled by the contract's demand multiplier.
    #[must_use]
    pub fn final_demand(&self, period: BillingPeriod) -> Option<Kw> {
        self.demand
            .iter()
            .filter(|record| record.is_final && record.period == period)
            .map(|record| record.max_demand_kw.scale(self.contract.demand_multiplier))
            .max()
    }

    /// Up to `count` finalized peak demands of the periods up to and including `upto`, most
    /// recent first.
    #[must_use]
    pub fn recent_final_demands(&self, upto: BillingPeriod, count: usize) -> Vec<(BillingPeriod, Kw)> {
        let mut periods: Vec<BillingPeriod> = self
            .demand
            .iter()
            .filter(|record| record.is_final && record.period <= upto)
            .map(|record| record.period)
            .collect();

        periods.sort_unstable_by(|a, b| b.cmp(a));
        periods.dedup();

        periods
            .into_iter()
            .take(count)
            .filter_map(|period| self.final_demand(period).map(|kw| (period, kw)))
            .collect()
    }

    /// Reject negative quantities and prices before anything is composed.
    pub(crate) fn validate(&self) -> Result<()> {
        self.contract.validate()?;

        for record in &self.consumption {
            record.validate()?;
        }

        for price in &self.wholesale_prices {
            price.price_per_kwh.non_negative("wholesale_prices.price_per_kwh")?;
        }

        for record in &self.demand {
            record.max_demand_kw.non_negative("demand.max_demand_kw")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{contract::ContractSettings, meter::DemandRecord, BillingInput};
    use crate::types::{electricity::Kw, time::BillingPeriod};

    fn demand(year: i32, month: u32, kw: rust_decimal::Decimal, is_final: bool) -> DemandRecord {
        DemandRecord {
            period: BillingPeriod::new(year, month).unwrap(),
            max_demand_kw: Kw::from(kw),
            is_final,
        }
    }

    #[test]
    fn provisional_demand_is_ignored() {
        let mut input = BillingInput::new(ContractSettings::new("TR-010"));
        input.demand.push(demand(2024, 3, dec!(140), false));

        assert_eq!(input.final_demand(BillingPeriod::new(2024, 3).unwrap()), None);
    }

    #[test]
    fn demand_is_scaled_by_multiplier() {
        let mut contract = ContractSettings::new("TR-011");
        contract.demand_multiplier = dec!(40);
        let mut input = BillingInput::new(contract);
        input.demand.push(demand(2024, 3, dec!(3.25), true));

        assert_eq!(
            input.final_demand(BillingPeriod::new(2024, 3).unwrap()),
            Some(Kw::from(dec!(130)))
        );
    }

    #[test]
    fn recent_demands_are_newest_first_and_bounded() {
        let mut input = BillingInput::new(ContractSettings::new("TR-012"));
        input.demand.push(demand(2023, 12, dec!(90), true));
        input.demand.push(demand(2024, 2, dec!(110), true));
        input.demand.push(demand(2024, 1, dec!(95), true));
        input.demand.push(demand(2024, 3, dec!(150), false));
        input.demand.push(demand(2024, 4, dec!(150), true));

        let recent = input.recent_final_demands(BillingPeriod::new(2024, 3).unwrap(), 3);
        let values: Vec<Kw> = recent.iter().map(|(_, kw)| *kw).collect();

        assert_eq!(
            values,
            vec![Kw::from(dec!(110)), Kw::from(dec!(95)), Kw::from(dec!(90))]
        );
    }
}
