//! Composition of the itemized invoice.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    demand::PowerCharges,
    rates::TariffRates,
    reactive::ReactivePenalty,
    types::{
        electricity::Kwh,
        money::{Money, Rate},
    },
    Result,
};

/// `(wholesale + surcharge estimate) × multiplier`, in TL/kWh.
#[must_use]
pub fn energy_unit_price(wholesale: Money, surcharge_estimate: Money, multiplier: Decimal) -> Money {
    (wholesale + surcharge_estimate).scale(multiplier)
}

/// Everything the composer needs for one invoice.
#[derive(Clone, Copy, Debug)]
pub struct Composition<'a> {
    pub energy_unit_price: Money,
    pub billable_kwh: Kwh,
    pub transformer_loss_kwh: Kwh,
    pub rates: &'a TariffRates,
    pub power: PowerCharges,
    pub reactive: ReactivePenalty,
}

/// The itemized invoice. Every line is kept, not just the total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceBreakdown {
    pub energy_unit_price: Money,
    pub billable_kwh: Kwh,
    pub energy_charge: Money,
    pub transformer_loss_charge: Money,
    pub surcharge_tax: Money,
    pub distribution_charge: Money,
    pub power_base_charge: Money,
    pub power_excess_charge: Money,
    pub reactive_penalty: Money,
    pub subtotal: Money,
    pub vat_rate: Rate,
    pub vat: Money,
    pub total: Money,
}

/// The charge lines of an invoice, in the order they are composed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChargeLine {
    Energy,
    TransformerLoss,
    SurchargeTax,
    Distribution,
    PowerBase,
    PowerExcess,
    ReactivePenalty,
}

impl Display for ChargeLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Energy => "Energy",
            Self::TransformerLoss => "Transformer loss",
            Self::SurchargeTax => "Surcharge tax (BTV)",
            Self::Distribution => "Distribution",
            Self::PowerBase => "Contracted power",
            Self::PowerExcess => "Power excess",
            Self::ReactivePenalty => "Reactive penalty",
        };

        f.write_str(display)
    }
}

impl InvoiceBreakdown {
    /// The pre-tax lines in composition order.
    #[must_use]
    pub fn lines(&self) -> [(ChargeLine, Money); 7] {
        [
            (ChargeLine::Energy, self.energy_charge),
            (ChargeLine::TransformerLoss, self.transformer_loss_charge),
            (ChargeLine::SurchargeTax, self.surcharge_tax),
            (ChargeLine::Distribution, self.distribution_charge),
            (ChargeLine::PowerBase, self.power_base_charge),
            (ChargeLine::PowerExcess, self.power_excess_charge),
            (ChargeLine::ReactivePenalty, self.reactive_penalty),
        ]
    }
}

/// Compose an invoice. Later lines depend on earlier ones, so the order below is fixed.
///
/// Quantities and unit prices are validated first; a negative one is an input error, never a
/// billing outcome.
pub fn compose(composition: &Composition<'_>) -> Result<InvoiceBreakdown> {
    let Composition {
        energy_unit_price,
        billable_kwh,
        transformer_loss_kwh,
        rates,
        power,
        reactive,
    } = *composition;

    let energy_unit_price = energy_unit_price.non_negative("energy_unit_price")?;
    let billable_kwh = billable_kwh.non_negative("billable_kwh")?;
    let transformer_loss_kwh = transformer_loss_kwh.non_negative("transformer_loss_kwh")?;
    power.base_charge.non_negative("power_base_charge")?;
    power.excess_charge.non_negative("power_excess_charge")?;
    reactive.charge.non_negative("reactive_penalty")?;

    let energy_charge = energy_unit_price * billable_kwh;
    let transformer_loss_charge = energy_unit_price * transformer_loss_kwh;
    let surcharge_tax = (energy_charge + transformer_loss_charge) * rates.surcharge_tax_rate;
    let distribution_charge = rates.distribution_price * billable_kwh;

    let subtotal = energy_charge
        + transformer_loss_charge
        + surcharge_tax
        + distribution_charge
        + power.total()
        + reactive.charge;

    let vat = subtotal * rates.vat_rate;
    let total = subtotal + vat;

    tracing::debug!(%energy_unit_price, %billable_kwh, %subtotal, %total, "composed invoice");

    Ok(InvoiceBreakdown {
        energy_unit_price,
        billable_kwh,
        energy_charge,
        transformer_loss_charge,
        surcharge_tax,
        distribution_charge,
        power_base_charge: power.base_charge,
        power_excess_charge: power.excess_charge,
        reactive_penalty: reactive.charge,
        subtotal,
        vat_rate: rates.vat_rate,
        vat,
        total,
    })
}
