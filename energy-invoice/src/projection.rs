//! Hour alignment of consumption against wholesale prices, and the "to date" projection of the
//! open billing period.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    input::{market::HourlyPrice, meter::HourlyConsumption},
    invoicer::{Invoice, InvoiceKind, Invoicer},
    types::{
        electricity::Kwh,
        money::Money,
        time::{truncate_to_hour, BillingPeriod, DateTime, TimeWindow},
    },
    Error, Result,
};

/// How much of the consumption in a window could be priced.
///
/// Readings without a wholesale price for their hour are never priced at zero or interpolated;
/// they are left out of billing and counted here instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub window: TimeWindow,
    /// The latest hour with a wholesale price in the window.
    pub cutoff: Option<DateTime>,
    /// All active energy read in the window.
    pub consumed_kwh: Kwh,
    /// Energy with a matching wholesale price.
    pub billable_kwh: Kwh,
    /// Energy without a matching wholesale price.
    pub skipped_kwh: Kwh,
    /// Number of readings without a matching wholesale price.
    pub skipped_readings: usize,
    /// Sum of `consumption × price` over the billable readings.
    pub weighted_cost: Money,
}

impl Coverage {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped_readings == 0
    }

    /// Consumption weighted average wholesale price; `None` without billable energy.
    #[must_use]
    pub fn average_price(&self) -> Option<Money> {
        if self.billable_kwh.is_zero() {
            return None;
        }

        self.weighted_cost.per_kwh(self.billable_kwh)
    }
}

/// The latest hour in `window` for which a wholesale price exists.
#[must_use]
pub fn latest_price_hour(prices: &[HourlyPrice], window: TimeWindow) -> Option<DateTime> {
    prices
        .iter()
        .filter(|price| window.contains(price.timestamp))
        .map(|price| truncate_to_hour(price.timestamp))
        .max()
}

/// Join consumption and wholesale prices hour by hour over `window`.
#[must_use]
pub fn align_hourly(
    consumption: &[HourlyConsumption],
    prices: &[HourlyPrice],
    window: TimeWindow,
) -> Coverage {
    let price_by_hour: HashMap<DateTime, Money> = prices
        .iter()
        .filter(|price| window.contains(price.timestamp))
        .map(|price| (truncate_to_hour(price.timestamp), price.price_per_kwh))
        .collect();

    let mut consumed_kwh = Kwh::zero();
    let mut billable_kwh = Kwh::zero();
    let mut skipped_kwh = Kwh::zero();
    let mut skipped_readings = 0;
    let mut weighted_cost = Money::zero();

    for reading in consumption
        .iter()
        .filter(|reading| window.contains(reading.timestamp))
    {
        consumed_kwh += reading.active_kwh;

        if let Some(&price) = price_by_hour.get(&truncate_to_hour(reading.timestamp)) {
            weighted_cost += price * reading.active_kwh;
            billable_kwh += reading.active_kwh;
        } else {
            skipped_kwh += reading.active_kwh;
            skipped_readings += 1;
        }
    }

    Coverage {
        window,
        cutoff: price_by_hour.keys().max().copied(),
        consumed_kwh,
        billable_kwh,
        skipped_kwh,
        skipped_readings,
        weighted_cost,
    }
}

impl Invoicer<'_> {
    /// Project the invoice of the billing period that is still open at `now`.
    ///
    /// The projection runs through the latest hour that has a wholesale price and is otherwise
    /// computed exactly like a closed invoice, so it converges to the real bill as the period
    /// progresses.
    pub fn project_to_date(&self, now: DateTime) -> Result<Invoice> {
        let time_zone = self.policy().time_zone;
        let period = BillingPeriod::containing(now, time_zone);

        self.validate()?;
        let surcharge_estimate = self.surcharge_estimate(period)?;

        let full = period.window(time_zone);
        let cutoff = latest_price_hour(&self.input().wholesale_prices, full)
            .ok_or(Error::NoWholesalePrice(period))?;

        tracing::debug!(%period, %cutoff, "projecting open period");

        self.build(
            period,
            full.through_hour(cutoff),
            InvoiceKind::ToDate,
            surcharge_estimate,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{align_hourly, latest_price_hour};
    use crate::{
        input::{
            contract::TariffClassification,
            market::{HourlyPrice, SurchargeRecord},
            meter::HourlyConsumption,
            BillingInput,
        },
        invoicer::{InvoiceKind, Invoicer},
        policy::Policy,
        rates::{
            tests::{contract, row},
            TariffTable,
        },
        types::{
            electricity::{Kvarh, Kwh},
            money::Money,
            time::{BillingPeriod, DateTime, TimeWindow},
        },
        Error,
    };

    fn hour(day: u32, hour: u32) -> DateTime {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn reading(at: DateTime, kwh: Decimal) -> HourlyConsumption {
        HourlyConsumption {
            timestamp: at,
            active_kwh: Kwh::from(kwh),
            inductive_kvarh: Kvarh::zero(),
            capacitive_kvarh: Kvarh::zero(),
        }
    }

    fn price(at: DateTime, price: Decimal) -> HourlyPrice {
        HourlyPrice {
            timestamp: at,
            price_per_kwh: Money::from(price),
        }
    }

    fn utc_policy() -> Policy {
        Policy {
            time_zone: chrono_tz::Tz::UTC,
            ..Policy::default()
        }
    }

    fn march_window() -> TimeWindow {
        BillingPeriod::new(2024, 3)
            .unwrap()
            .window(chrono_tz::Tz::UTC)
    }

    #[test]
    fn unpriced_hours_are_skipped_not_zero_priced() {
        let consumption = vec![
            reading(hour(1, 0), dec!(10)),
            reading(hour(1, 1), dec!(20)),
            reading(hour(1, 2), dec!(30)),
        ];
        let prices = vec![price(hour(1, 0), dec!(2)), price(hour(1, 2), dec!(3))];

        let coverage = align_hourly(&consumption, &prices, march_window());

        assert_eq!(coverage.billable_kwh, Kwh::from(dec!(40)));
        assert_eq!(coverage.skipped_kwh, Kwh::from(dec!(20)));
        assert_eq!(coverage.skipped_readings, 1);
        assert_eq!(coverage.weighted_cost, Money::from(dec!(110)));
        assert_eq!(coverage.average_price(), Some(Money::from(dec!(2.75))));
        assert!(!coverage.is_complete());
    }

    #[test]
    fn billable_and_skipped_add_up_to_consumption() {
        let consumption: Vec<HourlyConsumption> = (0..48)
            .map(|h| reading(hour(2, 0) + Duration::hours(h), Decimal::from(h + 1)))
            .collect();
        let prices: Vec<HourlyPrice> = (0..48)
            .filter(|h| h % 5 != 0)
            .map(|h| price(hour(2, 0) + Duration::hours(h), dec!(1.9)))
            .collect();

        let coverage = align_hourly(&consumption, &prices, march_window());

        assert_eq!(
            coverage.billable_kwh + coverage.skipped_kwh,
            coverage.consumed_kwh
        );
        assert_eq!(coverage.consumed_kwh, Kwh::from(dec!(1176)));
    }

    #[test]
    fn readings_within_an_hour_share_its_price() {
        let quarter = Utc.with_ymd_and_hms(2024, 3, 1, 5, 15, 0).unwrap();
        let consumption = vec![reading(quarter, dec!(4))];
        let prices = vec![price(hour(1, 5), dec!(2.5))];

        let coverage = align_hourly(&consumption, &prices, march_window());
        assert_eq!(coverage.weighted_cost, Money::from(dec!(10)));
    }

    #[test]
    fn cutoff_is_the_latest_price_in_the_window() {
        let prices = vec![
            price(hour(3, 23), dec!(2)),
            price(hour(5, 10), dec!(2)),
            price(Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap(), dec!(2)),
        ];

        assert_eq!(latest_price_hour(&prices, march_window()), Some(hour(5, 10)));
    }

    fn projection_input() -> BillingInput {
        let mut input = BillingInput::new(contract(TariffClassification::Single));

        for h in 0..6 {
            input.consumption.push(reading(hour(10, h), dec!(100)));
        }
        // Prices are published through 03:00 only.
        for h in 0..4 {
            input.wholesale_prices.push(price(hour(10, h), dec!(2)));
        }

        input.surcharges.push(SurchargeRecord {
            period: BillingPeriod::new(2024, 3).unwrap(),
            estimate: Some(Money::from(dec!(0.5))),
            finalized: None,
        });

        input
    }

    #[test]
    fn projection_stops_at_the_last_priced_hour() {
        let input = projection_input();
        let table = TariffTable::new(vec![row(TariffClassification::Single, "OG", dec!(0.5))]);
        let invoicer = Invoicer::new(&input, &table).with_policy(utc_policy());

        let projection = invoicer.project_to_date(hour(10, 5)).unwrap();

        assert_eq!(projection.kind, InvoiceKind::ToDate);
        assert_eq!(projection.coverage.cutoff, Some(hour(10, 3)));
        assert_eq!(projection.coverage.billable_kwh, Kwh::from(dec!(400)));
        assert_eq!(projection.coverage.skipped_kwh, Kwh::zero());
        assert_eq!(
            projection.breakdown.energy_unit_price,
            Money::from(dec!(2.5))
        );
        assert_eq!(projection.breakdown.energy_charge, Money::from(dec!(1000)));
        assert!(!projection.true_up.is_available());
        assert_eq!(projection.payable, projection.breakdown.total);
    }

    #[test]
    fn projection_requires_the_current_estimate() {
        let mut input = projection_input();
        input.surcharges.clear();
        let table = TariffTable::new(vec![row(TariffClassification::Single, "OG", dec!(0.5))]);
        let invoicer = Invoicer::new(&input, &table).with_policy(utc_policy());

        let err = invoicer.project_to_date(hour(10, 5)).unwrap_err();
        assert!(matches!(err, Error::MissingSurchargeEstimate(_)));
        assert_eq!(err.kind(), crate::ErrorKind::InsufficientData);
    }

    #[test]
    fn projection_requires_a_price_this_period() {
        let mut input = projection_input();
        input.wholesale_prices.clear();
        let table = TariffTable::new(vec![row(TariffClassification::Single, "OG", dec!(0.5))]);
        let invoicer = Invoicer::new(&input, &table).with_policy(utc_policy());

        let err = invoicer.project_to_date(hour(10, 5)).unwrap_err();
        assert!(matches!(err, Error::NoWholesalePrice(_)));
    }

    #[test]
    fn projection_requires_billable_energy() {
        let mut input = projection_input();
        input.consumption.clear();
        let table = TariffTable::new(vec![row(TariffClassification::Single, "OG", dec!(0.5))]);
        let invoicer = Invoicer::new(&input, &table).with_policy(utc_policy());

        let err = invoicer.project_to_date(hour(10, 5)).unwrap_err();
        assert!(matches!(err, Error::NoBillableConsumption(_)));
    }
}
