use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tariff::TariffKey;
use crate::{
    types::electricity::{Kw, Kwh},
    Error, Result,
};

/// Whether a contract is billed on energy alone or also on contracted power ("terim").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffClassification {
    /// Flat energy and distribution billing, no demand charge.
    #[serde(alias = "tek_terim", alias = "single_term")]
    Single,
    /// Adds a contracted-power charge and a charge for exceeding it.
    #[serde(alias = "cift_terim", alias = "dual_term")]
    Dual,
}

impl TariffClassification {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Single => Self::Dual,
            Self::Dual => Self::Single,
        }
    }
}

impl Display for TariffClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Single => "single",
            Self::Dual => "dual",
        };

        f.write_str(display)
    }
}

/// The billing settings of a single metering contract.
///
/// Column names used by older schemas are accepted as aliases, so the rest of the engine only
/// deals with this one shape.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContractSettings {
    /// Identifier of the contract or metering point.
    pub id: String,

    /// Per-contract factor on the energy unit price ("KBK").
    #[serde(alias = "kbk", default = "unit_multiplier")]
    pub multiplier: Decimal,

    /// Factor applied to raw peak demand readings.
    #[serde(alias = "carpan", default = "unit_multiplier")]
    pub demand_multiplier: Decimal,

    /// Fixed monthly transformer loss allowance.
    #[serde(alias = "trafo_kayip_kwh", default)]
    pub transformer_loss_kwh: Option<Kwh>,

    #[serde(alias = "terim", default)]
    pub classification: Option<TariffClassification>,

    #[serde(alias = "gerilim", default)]
    pub voltage_class: Option<String>,

    #[serde(alias = "tarife", default)]
    pub tariff_class: Option<String>,

    /// The contracted power limit, required for dual-rate contracts.
    #[serde(alias = "sozlesme_gucu", default)]
    pub contracted_power_kw: Option<Kw>,

    /// When disabled the surcharge tax (BTV) is never charged, whatever the published rate.
    #[serde(alias = "btv_enabled", default = "enabled")]
    pub surcharge_tax_enabled: bool,
}

fn unit_multiplier() -> Decimal {
    Decimal::ONE
}

fn enabled() -> bool {
    true
}

impl ContractSettings {
    /// Settings with every optional field unset and both multipliers at one.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            multiplier: unit_multiplier(),
            demand_multiplier: unit_multiplier(),
            transformer_loss_kwh: None,
            classification: None,
            voltage_class: None,
            tariff_class: None,
            contracted_power_kw: None,
            surcharge_tax_enabled: true,
        }
    }

    pub fn classification(&self) -> Result<TariffClassification> {
        self.classification
            .ok_or_else(|| self.missing("classification"))
    }

    /// The key of the published tariff row that applies to this contract.
    pub fn tariff_key(&self) -> Result<TariffKey> {
        let classification = self.classification()?;
        let voltage_class = self
            .voltage_class
            .clone()
            .ok_or_else(|| self.missing("voltage_class"))?;
        let tariff_class = self
            .tariff_class
            .clone()
            .ok_or_else(|| self.missing("tariff_class"))?;

        Ok(TariffKey {
            classification,
            voltage_class,
            tariff_class,
        })
    }

    pub fn contracted_power(&self) -> Result<Kw> {
        self.contracted_power_kw
            .ok_or_else(|| self.missing("contracted_power_kw"))?
            .non_negative("contracted_power_kw")
    }

    /// The transformer loss allowance, zero when none is configured.
    pub fn transformer_loss(&self) -> Result<Kwh> {
        self.transformer_loss_kwh
            .unwrap_or_else(Kwh::zero)
            .non_negative("transformer_loss_kwh")
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.multiplier.is_sign_negative() && !self.multiplier.is_zero() {
            return Err(Error::NegativeValue("multiplier"));
        }

        if self.demand_multiplier.is_sign_negative() && !self.demand_multiplier.is_zero() {
            return Err(Error::NegativeValue("demand_multiplier"));
        }

        Ok(())
    }

    fn missing(&self, setting: &'static str) -> Error {
        Error::MissingSetting {
            contract_id: self.id.clone(),
            setting,
        }
    }
}
