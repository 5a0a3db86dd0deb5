//! Resolution of a contract's published tariff row into concrete rates.

use serde::{Deserialize, Serialize};

use crate::{
    input::{
        contract::ContractSettings,
        tariff::{TariffKey, TariffRow},
    },
    types::money::{Money, Rate},
    Error, Result,
};

/// The published tariff table, shared by every contract.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TariffTable {
    rows: Vec<TariffRow>,
}

impl TariffTable {
    #[must_use]
    pub fn new(rows: Vec<TariffRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[TariffRow] {
        &self.rows
    }

    /// The single row matching `key`.
    ///
    /// No match and more than one match are both configuration errors; neither falls back to a
    /// default row.
    pub fn find(&self, key: &TariffKey) -> Result<&TariffRow> {
        let mut matches = self.rows.iter().filter(|row| key.matches(row));

        let row = matches
            .next()
            .ok_or_else(|| Error::TariffNotFound(key.clone()))?;

        let extra = matches.count();

        if extra > 0 {
            return Err(Error::AmbiguousTariff {
                key: key.clone(),
                matches: extra + 1,
            });
        }

        Ok(row)
    }
}

/// Unit prices and tax rates a contract is billed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TariffRates {
    /// TL per kWh.
    pub distribution_price: Money,
    /// TL per contracted kW.
    pub power_price: Money,
    /// TL per kW above the contracted power.
    pub power_overage_price: Money,
    pub vat_rate: Rate,
    /// The BTV rate, zero when the contract has it disabled.
    pub surcharge_tax_rate: Rate,
    /// TL per penalized kvarh.
    pub reactive_price: Money,
}

impl TariffRates {
    fn from_row(row: &TariffRow, surcharge_tax_enabled: bool) -> Result<Self> {
        let surcharge_tax_rate = if surcharge_tax_enabled {
            row.surcharge_tax_rate.non_negative("surcharge_tax_rate")?
        } else {
            Rate::zero()
        };

        Ok(Self {
            distribution_price: row.distribution_price.non_negative("distribution_price")?,
            power_price: row.power_price.non_negative("power_price")?,
            power_overage_price: row.power_overage_price.non_negative("power_overage_price")?,
            vat_rate: row.vat_rate.non_negative("vat_rate")?,
            surcharge_tax_rate,
            reactive_price: row.reactive_price.non_negative("reactive_price")?,
        })
    }
}

/// Resolve the rates of `contract` from `table`.
pub fn resolve_rates(table: &TariffTable, contract: &ContractSettings) -> Result<TariffRates> {
    let key = contract.tariff_key()?;
    resolve_key(table, &key, contract.surcharge_tax_enabled)
}

/// Resolve the rates of an explicit `key`, e.g. the counterpart row of a what-if comparison.
pub fn resolve_key(
    table: &TariffTable,
    key: &TariffKey,
    surcharge_tax_enabled: bool,
) -> Result<TariffRates> {
    let row = table.find(key)?;
    let rates = TariffRates::from_row(row, surcharge_tax_enabled)?;

    tracing::debug!(%key, ?rates, "resolved tariff rates");

    Ok(rates)
}
