use std::{collections::HashMap, fmt::Display};

use crate::{
    input::{
        contract::TariffClassification,
        tariff::{TariffKey, TariffRow},
    },
    rates::TariffTable,
};

#[derive(Debug, PartialEq, Eq)]
pub enum Warning {
    /// Several rows share a key, so resolving that key fails.
    DuplicateKey {
        key: TariffKey,
        row_indices: Vec<usize>,
    },
    /// A rate above one, most likely entered as a percentage instead of a fraction.
    RateLooksLikePercentage {
        row_index: usize,
        field: &'static str,
    },
    NegativePrice {
        row_index: usize,
        field: &'static str,
    },
    /// A single-rate row with power prices, which are never charged.
    UnusedPowerPrice { row_index: usize },
    /// A dual-rate row without an overage price, so excess demand is free.
    MissingOveragePrice { row_index: usize },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey { key, row_indices } => write!(
                f,
                "Rows {row_indices:?} share the key `{key}`, contracts on it cannot be invoiced."
            ),
            Self::RateLooksLikePercentage { row_index, field } => write!(
                f,
                "Row {row_index} has `{field}` above 1, rates are fractions, consider dividing by 100."
            ),
            Self::NegativePrice { row_index, field } => {
                write!(f, "Row {row_index} has a negative `{field}`.")
            }
            Self::UnusedPowerPrice { row_index } => write!(
                f,
                "Row {row_index} is single-rate but has power prices, they are never charged."
            ),
            Self::MissingOveragePrice { row_index } => write!(
                f,
                "Row {row_index} is dual-rate without a power overage price, excess demand is not charged."
            ),
        }
    }
}

/// Lint the provided tariff table and produce a set of relevant warnings.
pub fn lint(table: &TariffTable) -> Vec<Warning> {
    let mut warnings = Vec::new();

    lint_duplicates(table.rows(), &mut warnings);

    for (row_index, row) in table.rows().iter().enumerate() {
        lint_row(row_index, row, &mut warnings);
    }

    warnings
}

fn lint_duplicates(rows: &[TariffRow], warnings: &mut Vec<Warning>) {
    let mut by_key: HashMap<(TariffClassification, String, String), Vec<usize>> = HashMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        let normalized = (
            row.classification,
            row.voltage_class.trim().to_ascii_lowercase(),
            row.tariff_class.trim().to_ascii_lowercase(),
        );

        by_key.entry(normalized).or_default().push(row_index);
    }

    let mut duplicates: Vec<Vec<usize>> = by_key
        .into_values()
        .filter(|indices| indices.len() > 1)
        .collect();

    // Report in table order.
    duplicates.sort_unstable();

    for row_indices in duplicates {
        let Some(&first) = row_indices.first() else {
            continue;
        };

        warnings.push(Warning::DuplicateKey {
            key: rows[first].key(),
            row_indices,
        });
    }
}

fn lint_row(row_index: usize, row: &TariffRow, warnings: &mut Vec<Warning>) {
    for (field, rate) in [
        ("vat_rate", row.vat_rate),
        ("surcharge_tax_rate", row.surcharge_tax_rate),
    ] {
        if rate.exceeds_one() {
            warnings.push(Warning::RateLooksLikePercentage { row_index, field });
        }
    }

    for (field, price) in [
        ("distribution_price", row.distribution_price),
        ("power_price", row.power_price),
        ("power_overage_price", row.power_overage_price),
        ("reactive_price", row.reactive_price),
    ] {
        if price.is_negative() {
            warnings.push(Warning::NegativePrice { row_index, field });
        }
    }

    match row.classification {
        TariffClassification::Single => {
            if !row.power_price.is_zero() || !row.power_overage_price.is_zero() {
                warnings.push(Warning::UnusedPowerPrice { row_index });
            }
        }
        TariffClassification::Dual => {
            if row.power_overage_price.is_zero() {
                warnings.push(Warning::MissingOveragePrice { row_index });
            }
        }
    }
}
