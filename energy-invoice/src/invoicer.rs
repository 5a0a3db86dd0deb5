use serde::Serialize;

use crate::{
    composer::{compose, energy_unit_price, Composition, InvoiceBreakdown},
    demand::{power_charges, PowerCharges},
    input::{contract::TariffClassification, meter::ConsumptionTotals, BillingInput},
    policy::Policy,
    projection::{align_hourly, Coverage},
    rates::{resolve_rates, TariffRates, TariffTable},
    reactive::{reactive_penalty, ReactivePenalty},
    true_up::{surcharge_true_up, TrueUp},
    types::{
        money::Money,
        time::{BillingPeriod, TimeWindow},
    },
    Error, Result,
};

/// Invoicer that encapsulates the data of a single contract and the published tariffs.
///
/// Bill a closed period:
/// ```ignore
/// let invoicer = Invoicer::new(&input, &tariffs);
/// let invoice = invoicer.invoice(period)?;
/// ```
///
/// Or project the period that is still open:
/// ```ignore
/// let projection = Invoicer::new(&input, &tariffs).project_to_date(now)?;
/// ```
pub struct Invoicer<'a> {
    input: &'a BillingInput,
    tariffs: &'a TariffTable,
    policy: Policy,
}

/// Whether an invoice is a closed bill or a projection of the open period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Closed,
    ToDate,
}

/// The key under which an invoice is stored as an immutable snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SnapshotKey {
    pub contract_id: String,
    pub period: BillingPeriod,
    pub kind: InvoiceKind,
}

/// A computed invoice with everything that went into it.
#[derive(Clone, Debug, Serialize)]
pub struct Invoice {
    pub contract_id: String,
    pub period: BillingPeriod,
    pub kind: InvoiceKind,
    pub classification: TariffClassification,
    pub rates: TariffRates,
    pub coverage: Coverage,
    /// Metered totals over the invoiced window, used for the reactive check.
    pub totals: ConsumptionTotals,
    pub average_wholesale_price: Money,
    pub surcharge_estimate: Money,
    pub reactive: ReactivePenalty,
    pub power: PowerCharges,
    pub breakdown: InvoiceBreakdown,
    pub true_up: TrueUp,
    /// Invoice total plus the true-up.
    pub payable: Money,
}

impl Invoice {
    /// A dual-rate invoice without finalized demand data for its period.
    #[must_use]
    pub fn demand_missing(&self) -> bool {
        self.power.demand_missing
    }

    #[must_use]
    pub fn snapshot_key(&self) -> SnapshotKey {
        SnapshotKey {
            contract_id: self.contract_id.clone(),
            period: self.period,
            kind: self.kind,
        }
    }
}

impl<'a> Invoicer<'a> {
    /// Instantiate the invoicer with the default [`Policy`].
    #[must_use]
    pub fn new(input: &'a BillingInput, tariffs: &'a TariffTable) -> Self {
        Self {
            input,
            tariffs,
            policy: Policy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn input(&self) -> &'a BillingInput {
        self.input
    }

    pub(crate) fn tariffs(&self) -> &'a TariffTable {
        self.tariffs
    }

    pub(crate) fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Bill the closed `period`.
    ///
    /// The surcharge estimate of the period must be known; without it no total is computed.
    pub fn invoice(&self, period: BillingPeriod) -> Result<Invoice> {
        self.validate()?;
        let surcharge_estimate = self.surcharge_estimate(period)?;

        let window = period.window(self.policy.time_zone);

        if !self
            .input
            .wholesale_prices
            .iter()
            .any(|price| window.contains(price.timestamp))
        {
            return Err(Error::NoWholesalePrice(period));
        }

        self.build(period, window, InvoiceKind::Closed, surcharge_estimate)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.input.validate()
    }

    pub(crate) fn surcharge_estimate(&self, period: BillingPeriod) -> Result<Money> {
        self.input
            .surcharge(period)
            .and_then(|record| record.estimate)
            .ok_or(Error::MissingSurchargeEstimate(period))
    }

    /// The shared pipeline of closed invoices and projections over `window`.
    pub(crate) fn build(
        &self,
        period: BillingPeriod,
        window: TimeWindow,
        kind: InvoiceKind,
        surcharge_estimate: Money,
    ) -> Result<Invoice> {
        let contract = &self.input.contract;
        let classification = contract.classification()?;
        let rates = resolve_rates(self.tariffs, contract)?;

        let coverage = align_hourly(
            &self.input.consumption,
            &self.input.wholesale_prices,
            window,
        );

        if !coverage.is_complete() {
            tracing::warn!(
                contract = %contract.id,
                %period,
                skipped_kwh = %coverage.skipped_kwh,
                skipped_readings = coverage.skipped_readings,
                "consumption without wholesale price left out of billing"
            );
        }

        let average_wholesale_price = coverage
            .average_price()
            .ok_or(Error::NoBillableConsumption(period))?;

        let totals = ConsumptionTotals::over(&self.input.consumption, window);
        let reactive = reactive_penalty(&totals, self.policy.reactive_limits(), rates.reactive_price);
        let power = self.power_charges(classification, &rates, period)?;

        let breakdown = compose(&Composition {
            energy_unit_price: energy_unit_price(
                average_wholesale_price,
                surcharge_estimate,
                contract.multiplier,
            ),
            billable_kwh: coverage.billable_kwh,
            transformer_loss_kwh: contract.transformer_loss()?,
            rates: &rates,
            power,
            reactive,
        })?;

        let true_up = self.true_up(period, &rates)?;
        let payable = breakdown.total + true_up.amount();

        tracing::info!(
            contract = %contract.id,
            %period,
            ?kind,
            total = %breakdown.total,
            true_up = %true_up.amount(),
            %payable,
            "invoice computed"
        );

        Ok(Invoice {
            contract_id: contract.id.clone(),
            period,
            kind,
            classification,
            rates,
            coverage,
            totals,
            average_wholesale_price,
            surcharge_estimate,
            reactive,
            power,
            breakdown,
            true_up,
            payable,
        })
    }

    fn power_charges(
        &self,
        classification: TariffClassification,
        rates: &TariffRates,
        period: BillingPeriod,
    ) -> Result<PowerCharges> {
        match classification {
            TariffClassification::Single => Ok(PowerCharges::none()),
            TariffClassification::Dual => Ok(power_charges(
                self.input.contract.contracted_power()?,
                self.input.final_demand(period),
                rates.power_price,
                rates.power_overage_price,
            )),
        }
    }

    /// The true-up for the period before `period`, priced with the tax rates of `period`.
    fn true_up(&self, period: BillingPeriod, rates: &TariffRates) -> Result<TrueUp> {
        let reconciled = period.previous();
        let window = reconciled.window(self.policy.time_zone);
        let metered = self
            .input
            .consumption
            .iter()
            .any(|record| window.contains(record.timestamp));
        let consumption = metered
            .then(|| ConsumptionTotals::over(&self.input.consumption, window).active_kwh);

        surcharge_true_up(
            period,
            self.input.surcharge(reconciled),
            consumption,
            self.input.contract.multiplier,
            rates,
        )
    }
}
