use serde::{Deserialize, Serialize};

use crate::types::{
    money::Money,
    time::{BillingPeriod, DateTime},
};

/// The day-ahead wholesale price (PTF) of one hour.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HourlyPrice {
    pub timestamp: DateTime,

    /// TL per kWh.
    #[serde(alias = "ptf")]
    pub price_per_kwh: Money,
}

/// The renewable surcharge (YEKDEM) values published for one contract and period.
///
/// The estimate is known when the period is billed; the finalized value arrives about a month
/// later and drives the true-up on the next bill.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SurchargeRecord {
    pub period: BillingPeriod,

    /// TL per kWh used when the period was billed.
    #[serde(alias = "tahmini", default)]
    pub estimate: Option<Money>,

    /// TL per kWh once the official figure is published.
    #[serde(alias = "kesin", default)]
    pub finalized: Option<Money>,
}
