//! What-if pricing of an invoice under the opposite tariff classification.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::{
    composer::{compose, Composition, InvoiceBreakdown},
    demand::{power_charges, PowerCharges},
    input::{contract::TariffClassification, tariff::TariffKey},
    invoicer::{Invoice, Invoicer},
    rates::{resolve_key, TariffRates},
    reactive::{reactive_penalty, ReactivePenalty},
    types::{electricity::Kw, money::Money},
    Result,
};

/// Multiplier on the observed peak demand that stands in for the contracted power when a
/// single-rate contract is priced as dual-rate.
pub const SYNTHETIC_LIMIT_HEADROOM: Decimal = dec!(1.1);

/// What switching classification would save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "snake_case")]
pub enum Savings {
    /// The alternate classification is not cheaper.
    AlreadyOptimal,
    /// The alternate classification is cheaper by this amount, VAT included.
    Saves(Money),
}

impl Savings {
    fn between(actual: Money, alternate: Money) -> Self {
        let delta = actual - alternate;

        if delta.is_negative() || delta.is_zero() {
            Self::AlreadyOptimal
        } else {
            Self::Saves(delta)
        }
    }
}

/// An invoice priced under the opposite classification, next to the actual one.
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub actual_classification: TariffClassification,
    pub actual_total: Money,
    /// The key of the counterpart tariff row.
    pub alternate_key: TariffKey,
    pub alternate_rates: TariffRates,
    /// Contracted power assumed for the alternate pricing when the contract has none on record.
    pub synthetic_limit_kw: Option<Kw>,
    pub power: PowerCharges,
    pub reactive: ReactivePenalty,
    pub alternate: InvoiceBreakdown,
    pub savings: Savings,
}

impl Invoicer<'_> {
    /// Price `invoice` again under the opposite classification.
    ///
    /// Energy, consumption and reactive totals are taken from `invoice`; only the tariff row and
    /// the power charges change.
    pub fn compare(&self, invoice: &Invoice) -> Result<Comparison> {
        let contract = &self.input().contract;
        let policy = self.policy();

        let actual_key = contract.tariff_key()?;
        let alternate_class = actual_key.classification.opposite();

        let alternate_key = TariffKey {
            classification: alternate_class,
            voltage_class: policy
                .counterpart_voltage(&actual_key.voltage_class, alternate_class)
                .to_owned(),
            tariff_class: actual_key.tariff_class.clone(),
        };
        let alternate_rates =
            resolve_key(self.tariffs(), &alternate_key, contract.surcharge_tax_enabled)?;

        let (power, synthetic_limit_kw) = match alternate_class {
            TariffClassification::Single => (PowerCharges::none(), None),
            TariffClassification::Dual => {
                let peak = self.input().final_demand(invoice.period);
                let limit = peak
                    .map(|peak| peak.scale(policy.synthetic_limit_headroom))
                    .unwrap_or_else(Kw::zero);

                let power = power_charges(
                    limit,
                    peak,
                    alternate_rates.power_price,
                    alternate_rates.power_overage_price,
                );

                (power, Some(limit))
            }
        };

        let reactive = reactive_penalty(
            &invoice.totals,
            policy.reactive_limits(),
            alternate_rates.reactive_price,
        );

        let alternate = compose(&Composition {
            energy_unit_price: invoice.breakdown.energy_unit_price,
            billable_kwh: invoice.breakdown.billable_kwh,
            transformer_loss_kwh: contract.transformer_loss()?,
            rates: &alternate_rates,
            power,
            reactive,
        })?;

        let savings = Savings::between(invoice.breakdown.total, alternate.total);

        tracing::debug!(
            contract = %contract.id,
            period = %invoice.period,
            alternate = %alternate_key,
            ?savings,
            "compared with alternate classification"
        );

        Ok(Comparison {
            actual_classification: invoice.classification,
            actual_total: invoice.breakdown.total,
            alternate_key,
            alternate_rates,
            synthetic_limit_kw,
            power,
            reactive,
            alternate,
            savings,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::{Savings, SYNTHETIC_LIMIT_HEADROOM};
    use crate::{
        input::{
            contract::TariffClassification,
            market::{HourlyPrice, SurchargeRecord},
            meter::{DemandRecord, HourlyConsumption},
            BillingInput,
        },
        invoicer::Invoicer,
        policy::{Policy, VoltageCounterpart},
        rates::{
            tests::{contract, row},
            TariffTable,
        },
        types::{
            electricity::{Kvarh, Kw, Kwh},
            money::Money,
            time::BillingPeriod,
        },
        ErrorKind,
    };

    fn march() -> BillingPeriod {
        BillingPeriod::new(2024, 3).unwrap()
    }

    /// 10,000 kWh at an energy unit price of 2.5 on a single-rate contract.
    fn input(peak_kw: Option<rust_decimal::Decimal>) -> BillingInput {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();
        let mut input = BillingInput::new(contract(TariffClassification::Single));

        input.consumption.push(HourlyConsumption {
            timestamp: at,
            active_kwh: Kwh::from(dec!(10000)),
            inductive_kvarh: Kvarh::zero(),
            capacitive_kvarh: Kvarh::zero(),
        });
        input.wholesale_prices.push(HourlyPrice {
            timestamp: at,
            price_per_kwh: Money::from(dec!(2.0)),
        });
        input.surcharges.push(SurchargeRecord {
            period: march(),
            estimate: Some(Money::from(dec!(0.5))),
            finalized: None,
        });

        if let Some(kw) = peak_kw {
            input.demand.push(DemandRecord {
                period: march(),
                max_demand_kw: Kw::from(kw),
                is_final: true,
            });
        }

        input
    }

    #[test]
    fn default_headroom_is_ten_percent() {
        assert_eq!(SYNTHETIC_LIMIT_HEADROOM, dec!(1.1));
    }

    #[test]
    fn cheaper_actual_tariff_is_already_optimal() {
        let input = input(Some(dec!(80)));
        let table = TariffTable::new(vec![
            row(TariffClassification::Single, "OG", dec!(0.5)),
            row(TariffClassification::Dual, "OG", dec!(0.4)),
        ]);
        let invoicer = Invoicer::new(&input, &table);
        let invoice = invoicer.invoice(march()).unwrap();

        let comparison = invoicer.compare(&invoice).unwrap();

        assert_eq!(comparison.synthetic_limit_kw, Some(Kw::from(dec!(88))));
        assert_eq!(comparison.power.base_charge, Money::from(dec!(4400)));
        assert_eq!(comparison.power.excess_charge, Money::zero());
        assert_eq!(comparison.alternate.total, Money::from(dec!(40380)));
        assert_eq!(comparison.savings, Savings::AlreadyOptimal);
    }

    #[test]
    fn cheaper_alternate_reports_the_saving() {
        let input = input(Some(dec!(20)));
        let table = TariffTable::new(vec![
            row(TariffClassification::Single, "OG", dec!(0.5)),
            row(TariffClassification::Dual, "OG", dec!(0.1)),
        ]);
        let invoicer = Invoicer::new(&input, &table);
        let invoice = invoicer.invoice(march()).unwrap();

        let comparison = invoicer.compare(&invoice).unwrap();

        assert_eq!(comparison.alternate.subtotal, Money::from(dec!(27350)));
        assert_eq!(comparison.savings, Savings::Saves(Money::from(dec!(3480))));
    }

    #[test]
    fn missing_peak_uses_a_zero_limit_and_is_flagged() {
        let input = input(None);
        let table = TariffTable::new(vec![
            row(TariffClassification::Single, "OG", dec!(0.5)),
            row(TariffClassification::Dual, "OG", dec!(0.4)),
        ]);
        let invoicer = Invoicer::new(&input, &table);
        let invoice = invoicer.invoice(march()).unwrap();

        let comparison = invoicer.compare(&invoice).unwrap();

        assert_eq!(comparison.synthetic_limit_kw, Some(Kw::zero()));
        assert!(comparison.power.demand_missing);
        assert_eq!(comparison.power.total(), Money::zero());
    }

    #[test]
    fn voltage_class_is_mapped_to_its_counterpart() {
        let input = input(Some(dec!(80)));
        let table = TariffTable::new(vec![
            row(TariffClassification::Single, "OG", dec!(0.5)),
            row(TariffClassification::Dual, "AG", dec!(0.4)),
        ]);

        let unmapped = Invoicer::new(&input, &table);
        let invoice = unmapped.invoice(march()).unwrap();
        let err = unmapped.compare(&invoice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let policy = Policy {
            voltage_counterparts: vec![VoltageCounterpart {
                single: "OG".into(),
                dual: "AG".into(),
            }],
            ..Policy::default()
        };
        let mapped = Invoicer::new(&input, &table).with_policy(policy);
        let comparison = mapped.compare(&invoice).unwrap();

        assert_eq!(comparison.alternate_key.voltage_class, "AG");
    }

    #[test]
    fn dual_contract_is_compared_against_single_rate() {
        let mut input = input(Some(dec!(130)));
        input.contract.classification = Some(TariffClassification::Dual);
        input.contract.contracted_power_kw = Some(Kw::from(dec!(100)));
        let table = TariffTable::new(vec![
            row(TariffClassification::Single, "OG", dec!(0.5)),
            row(TariffClassification::Dual, "OG", dec!(0.4)),
        ]);
        let invoicer = Invoicer::new(&input, &table);
        let invoice = invoicer.invoice(march()).unwrap();

        let comparison = invoicer.compare(&invoice).unwrap();

        assert_eq!(comparison.synthetic_limit_kw, None);
        assert_eq!(comparison.alternate.power_base_charge, Money::zero());
        assert_eq!(comparison.alternate.power_excess_charge, Money::zero());
        assert_eq!(comparison.alternate.total, Money::from(dec!(36300)));
    }
}
