use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::contract::TariffClassification;
use crate::types::money::{Money, Rate};

/// The lookup key of a published tariff row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TariffKey {
    pub classification: TariffClassification,
    pub voltage_class: String,
    pub tariff_class: String,
}

impl TariffKey {
    /// Class names are compared case-insensitively, ignoring surrounding whitespace.
    #[must_use]
    pub fn matches(&self, row: &TariffRow) -> bool {
        self.classification == row.classification
            && same_class(&self.voltage_class, &row.voltage_class)
            && same_class(&self.tariff_class, &row.tariff_class)
    }
}

fn same_class(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl Display for TariffKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.classification, self.voltage_class, self.tariff_class
        )
    }
}

/// One row of the officially published tariff table.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TariffRow {
    #[serde(alias = "terim")]
    pub classification: TariffClassification,

    #[serde(alias = "gerilim")]
    pub voltage_class: String,

    #[serde(alias = "tarife")]
    pub tariff_class: String,

    /// Distribution fee per kWh.
    #[serde(alias = "dagitim_bedeli")]
    pub distribution_price: Money,

    /// Price per kW of contracted power, dual-rate rows only.
    #[serde(alias = "guc_bedeli", default)]
    pub power_price: Money,

    /// Price per kW of demand above the contracted power, dual-rate rows only.
    #[serde(alias = "guc_asim_bedeli", default)]
    pub power_overage_price: Money,

    #[serde(alias = "kdv")]
    pub vat_rate: Rate,

    /// The BTV rate applied to energy related charges.
    #[serde(alias = "btv")]
    pub surcharge_tax_rate: Rate,

    /// Price per penalized kvarh.
    #[serde(alias = "reaktif_bedel", default)]
    pub reactive_price: Money,
}

impl TariffRow {
    #[must_use]
    pub fn key(&self) -> TariffKey {
        TariffKey {
            classification: self.classification,
            voltage_class: self.voltage_class.clone(),
            tariff_class: self.tariff_class.clone(),
        }
    }
}
