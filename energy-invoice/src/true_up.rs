//! Reconciliation of the renewable surcharge (YEKDEM) of the previous period.
//!
//! A period is billed with an estimated surcharge. About a month later the finalized value is
//! published and the difference is settled on the next bill: the bill of period `M` carries the
//! true-up for period `M - 1`.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    input::market::SurchargeRecord,
    rates::TariffRates,
    types::{electricity::Kwh, money::Money, time::BillingPeriod},
    Error, Result,
};

/// Why no true-up could be computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSurcharge {
    /// No record at all for the reconciled period.
    Record,
    Estimate,
    Finalized,
    /// No consumption readings in the reconciled period.
    Consumption,
}

impl Display for MissingSurcharge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Record => "no surcharge record",
            Self::Estimate => "no surcharge estimate",
            Self::Finalized => "surcharge not finalized yet",
            Self::Consumption => "no consumption readings",
        };

        f.write_str(display)
    }
}

/// The true-up of a bill, or the reason it is not available yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrueUp {
    Available(SurchargeTrueUp),
    Unavailable {
        billing_period: BillingPeriod,
        reconciled_period: BillingPeriod,
        missing: MissingSurcharge,
    },
}

impl TrueUp {
    /// The signed amount added to the payable total; zero while unavailable.
    #[must_use]
    pub fn amount(&self) -> Money {
        match self {
            Self::Available(true_up) => true_up.amount,
            Self::Unavailable { .. } => Money::zero(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Which way the money flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The finalized surcharge was higher; the customer owes the difference.
    Debit,
    /// The finalized surcharge was lower; the customer is credited.
    Credit,
    Settled,
}

/// A computed true-up with every intermediate value of the calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SurchargeTrueUp {
    /// The period whose bill carries this true-up.
    pub billing_period: BillingPeriod,
    /// The period whose surcharge is being finalized, one before `billing_period`.
    pub reconciled_period: BillingPeriod,
    pub estimated: Money,
    pub finalized: Money,
    /// `finalized - estimated`, TL per kWh.
    pub difference_per_kwh: Money,
    /// Active consumption of the reconciled period.
    pub consumption_kwh: Kwh,
    pub delta_energy: Money,
    pub with_surcharge_tax: Money,
    /// Signed, VAT included. Positive is owed by the customer, negative is a credit.
    pub amount: Money,
}

impl SurchargeTrueUp {
    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.amount.is_zero() {
            Direction::Settled
        } else if self.amount.is_negative() {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }
}

/// Compute the true-up carried by the bill of `billing_period`.
///
/// `previous` is the surcharge record of the period before `billing_period`, passed in
/// explicitly; a record of any other period is rejected. `consumption_kwh` is the active
/// consumption of that previous period, `None` when no reading falls in it, and `rates` are the
/// tax rates of the billed period.
pub fn surcharge_true_up(
    billing_period: BillingPeriod,
    previous: Option<&SurchargeRecord>,
    consumption_kwh: Option<Kwh>,
    multiplier: Decimal,
    rates: &TariffRates,
) -> Result<TrueUp> {
    let reconciled_period = billing_period.previous();

    let unavailable = |missing: MissingSurcharge| -> Result<TrueUp> {
        tracing::warn!(%billing_period, %reconciled_period, %missing, "surcharge true-up unavailable");

        Ok(TrueUp::Unavailable {
            billing_period,
            reconciled_period,
            missing,
        })
    };

    let Some(record) = previous else {
        return unavailable(MissingSurcharge::Record);
    };

    if record.period != reconciled_period {
        return Err(Error::PeriodMismatch {
            expected: reconciled_period,
            found: record.period,
        });
    }

    let Some(estimated) = record.estimate else {
        return unavailable(MissingSurcharge::Estimate);
    };

    let Some(finalized) = record.finalized else {
        return unavailable(MissingSurcharge::Finalized);
    };

    let Some(consumption_kwh) = consumption_kwh else {
        return unavailable(MissingSurcharge::Consumption);
    };

    let consumption_kwh = consumption_kwh.non_negative("true_up.consumption_kwh")?;

    let difference_per_kwh = finalized - estimated;
    let delta_energy = difference_per_kwh.scale(multiplier) * consumption_kwh;
    let with_surcharge_tax = rates.surcharge_tax_rate.gross_up(delta_energy);
    let amount = rates.vat_rate.gross_up(with_surcharge_tax);

    tracing::debug!(%billing_period, %difference_per_kwh, %amount, "computed surcharge true-up");

    Ok(TrueUp::Available(SurchargeTrueUp {
        billing_period,
        reconciled_period,
        estimated,
        finalized,
        difference_per_kwh,
        consumption_kwh,
        delta_energy,
        with_surcharge_tax,
        amount,
    }))
}
