//! Advice on the contracted power of dual-rate contracts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::{
    input::contract::TariffClassification,
    invoicer::Invoicer,
    rates::resolve_rates,
    types::{electricity::Kw, money::Money, time::BillingPeriod},
    Result,
};

/// Safety margin kept above the observed peak, as a fraction of that peak.
pub const ADVISOR_BUFFER_RATIO: Decimal = dec!(0.1);

/// Number of recent finalized periods the advice is based on.
pub const ADVISOR_WINDOW: usize = 3;

/// What to do with the contracted power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "advice", rename_all = "snake_case")]
pub enum LimitAdvice {
    /// Single-rate contracts have no contracted power.
    NotApplicable,
    /// No finalized demand history or no overage price.
    InsufficientData,
    /// The observed peak reached the contracted power.
    Increase {
        contracted_kw: Kw,
        observed_peak_kw: Kw,
    },
    /// The contracted power is within the safety margin above the observed peak.
    Optimal {
        contracted_kw: Kw,
        observed_peak_kw: Kw,
        buffer_kw: Kw,
    },
    /// The contracted power can be lowered to `recommended_kw`.
    Decrease {
        contracted_kw: Kw,
        observed_peak_kw: Kw,
        buffer_kw: Kw,
        recommended_kw: Kw,
        estimated_monthly_saving: Money,
    },
}

/// Advise on `contracted` given the most recent finalized peaks.
#[must_use]
pub fn advise_limit(
    contracted: Kw,
    recent_peaks: &[Kw],
    overage_price: Money,
    buffer_ratio: Decimal,
) -> LimitAdvice {
    let Some(&observed_peak_kw) = recent_peaks.iter().max() else {
        return LimitAdvice::InsufficientData;
    };

    if overage_price.is_zero() {
        return LimitAdvice::InsufficientData;
    }

    if observed_peak_kw >= contracted {
        return LimitAdvice::Increase {
            contracted_kw: contracted,
            observed_peak_kw,
        };
    }

    let buffer_kw = observed_peak_kw.scale(buffer_ratio);

    if contracted.saturating_sub(observed_peak_kw) < buffer_kw {
        return LimitAdvice::Optimal {
            contracted_kw: contracted,
            observed_peak_kw,
            buffer_kw,
        };
    }

    let recommended_kw = observed_peak_kw.saturating_add(buffer_kw);

    LimitAdvice::Decrease {
        contracted_kw: contracted,
        observed_peak_kw,
        buffer_kw,
        recommended_kw,
        estimated_monthly_saving: overage_price * contracted.saturating_sub(recommended_kw),
    }
}

/// The advice together with the demand history it is based on.
#[derive(Clone, Debug, Serialize)]
pub struct DemandAdvice {
    pub contract_id: String,
    pub period: BillingPeriod,
    /// The finalized peaks looked at, most recent first.
    pub recent_peaks: Vec<(BillingPeriod, Kw)>,
    pub advice: LimitAdvice,
}

impl Invoicer<'_> {
    /// Advise on the contracted power using the finalized peaks up to and including `period`.
    pub fn advise_limit(&self, period: BillingPeriod) -> Result<DemandAdvice> {
        let input = self.input();
        let contract = &input.contract;
        let policy = self.policy();

        let (recent_peaks, advice) = match contract.classification()? {
            TariffClassification::Single => (Vec::new(), LimitAdvice::NotApplicable),
            TariffClassification::Dual => {
                let contracted = contract.contracted_power()?;
                let rates = resolve_rates(self.tariffs(), contract)?;
                let recent_peaks = input.recent_final_demands(period, policy.advisor_window);
                let peaks: Vec<Kw> = recent_peaks.iter().map(|(_, kw)| *kw).collect();

                let advice = advise_limit(
                    contracted,
                    &peaks,
                    rates.power_overage_price,
                    policy.advisor_buffer_ratio,
                );

                (recent_peaks, advice)
            }
        };

        tracing::debug!(contract = %contract.id, %period, ?advice, "contracted power advice");

        Ok(DemandAdvice {
            contract_id: contract.id.clone(),
            period,
            recent_peaks,
            advice,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{advise_limit, LimitAdvice, ADVISOR_BUFFER_RATIO};
    use crate::{
        input::{contract::TariffClassification, meter::DemandRecord, BillingInput},
        invoicer::Invoicer,
        rates::{
            tests::{contract, row},
            TariffTable,
        },
        types::{electricity::Kw, money::Money, time::BillingPeriod},
    };

    fn kw(value: rust_decimal::Decimal) -> Kw {
        Kw::from(value)
    }

    fn overage() -> Money {
        Money::from(dec!(150))
    }

    #[test]
    fn peak_at_the_limit_should_increase() {
        let advice = advise_limit(
            kw(dec!(100)),
            &[kw(dec!(60)), kw(dec!(100))],
            overage(),
            ADVISOR_BUFFER_RATIO,
        );

        assert!(matches!(advice, LimitAdvice::Increase { .. }));
    }

    #[test]
    fn limit_within_buffer_is_optimal() {
        let advice = advise_limit(
            kw(dec!(100)),
            &[kw(dec!(95)), kw(dec!(80))],
            overage(),
            ADVISOR_BUFFER_RATIO,
        );

        assert_eq!(
            advice,
            LimitAdvice::Optimal {
                contracted_kw: kw(dec!(100)),
                observed_peak_kw: kw(dec!(95)),
                buffer_kw: kw(dec!(9.5)),
            }
        );
    }

    #[test]
    fn oversized_limit_should_decrease() {
        let advice = advise_limit(
            kw(dec!(100)),
            &[kw(dec!(50)), kw(dec!(60)), kw(dec!(40))],
            overage(),
            ADVISOR_BUFFER_RATIO,
        );

        assert_eq!(
            advice,
            LimitAdvice::Decrease {
                contracted_kw: kw(dec!(100)),
                observed_peak_kw: kw(dec!(60)),
                buffer_kw: kw(dec!(6)),
                recommended_kw: kw(dec!(66)),
                estimated_monthly_saving: Money::from(dec!(5100)),
            }
        );
    }

    #[test]
    fn no_history_or_price_is_insufficient_data() {
        assert_eq!(
            advise_limit(kw(dec!(100)), &[], overage(), ADVISOR_BUFFER_RATIO),
            LimitAdvice::InsufficientData
        );
        assert_eq!(
            advise_limit(
                kw(dec!(100)),
                &[kw(dec!(50))],
                Money::zero(),
                ADVISOR_BUFFER_RATIO
            ),
            LimitAdvice::InsufficientData
        );
    }

    fn period(month: u32) -> BillingPeriod {
        BillingPeriod::new(2024, month).unwrap()
    }

    #[test]
    fn only_the_most_recent_final_peaks_count() {
        let mut input = BillingInput::new(contract(TariffClassification::Dual));
        input.contract.contracted_power_kw = Some(kw(dec!(100)));

        for (month, peak, is_final) in [
            (1, dec!(99), true),
            (2, dec!(50), true),
            (3, dec!(55), true),
            (4, dec!(60), true),
            (5, dec!(98), false),
        ] {
            input.demand.push(DemandRecord {
                period: period(month),
                max_demand_kw: kw(peak),
                is_final,
            });
        }

        let table = TariffTable::new(vec![row(TariffClassification::Dual, "OG", dec!(0.4))]);
        let advice = Invoicer::new(&input, &table).advise_limit(period(5)).unwrap();

        assert_eq!(advice.recent_peaks.len(), 3);
        assert_eq!(advice.recent_peaks.first(), Some(&(period(4), kw(dec!(60)))));
        assert!(matches!(
            advice.advice,
            LimitAdvice::Decrease { recommended_kw, .. } if recommended_kw == kw(dec!(66))
        ));
    }

    #[test]
    fn single_rate_contract_is_not_applicable() {
        let input = BillingInput::new(contract(TariffClassification::Single));
        let table = TariffTable::new(vec![row(TariffClassification::Single, "OG", dec!(0.5))]);

        let advice = Invoicer::new(&input, &table).advise_limit(period(3)).unwrap();
        assert_eq!(advice.advice, LimitAdvice::NotApplicable);
    }
}
