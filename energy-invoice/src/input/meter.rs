use serde::{Deserialize, Serialize};

use crate::{
    types::{
        electricity::{Kvarh, Kw, Kwh},
        time::{BillingPeriod, DateTime, TimeWindow},
    },
    Error, Result,
};

/// One hourly reading of a metering point.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HourlyConsumption {
    /// Start of the hour the reading covers.
    pub timestamp: DateTime,

    #[serde(alias = "aktif")]
    pub active_kwh: Kwh,

    #[serde(alias = "enduktif", default)]
    pub inductive_kvarh: Kvarh,

    #[serde(alias = "kapasitif", default)]
    pub capacitive_kvarh: Kvarh,
}

impl HourlyConsumption {
    pub(crate) fn validate(&self) -> Result<()> {
        self.active_kwh.non_negative("consumption.active_kwh")?;

        if self.inductive_kvarh < Kvarh::zero() {
            return Err(Error::NegativeValue("consumption.inductive_kvarh"));
        }

        if self.capacitive_kvarh < Kvarh::zero() {
            return Err(Error::NegativeValue("consumption.capacitive_kvarh"));
        }

        Ok(())
    }
}

/// Active and reactive energy summed over a time window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConsumptionTotals {
    pub active_kwh: Kwh,
    pub inductive_kvarh: Kvarh,
    pub capacitive_kvarh: Kvarh,
}

impl ConsumptionTotals {
    /// Sum every reading whose timestamp falls in `window`.
    #[must_use]
    pub fn over(records: &[HourlyConsumption], window: TimeWindow) -> Self {
        records
            .iter()
            .filter(|record| window.contains(record.timestamp))
            .fold(Self::default(), |mut totals, record| {
                totals.add(record);
                totals
            })
    }

    pub fn add(&mut self, record: &HourlyConsumption) {
        self.active_kwh += record.active_kwh;
        self.inductive_kvarh += record.inductive_kvarh;
        self.capacitive_kvarh += record.capacitive_kvarh;
    }
}

/// The peak demand measured for a contract in one period.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DemandRecord {
    pub period: BillingPeriod,

    /// The raw reading, before the contract's demand multiplier.
    #[serde(alias = "max_demand")]
    pub max_demand_kw: Kw,

    /// Provisional records are never billed.
    #[serde(default)]
    pub is_final: bool,
}
