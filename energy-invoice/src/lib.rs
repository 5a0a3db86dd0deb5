//! # Electricity invoice library
//!
//! Functionality to calculate the invoice of a metered electricity contract from hourly
//! consumption, hourly wholesale prices and the published tariff tables. Use the
//! [`invoicer::Invoicer`] to perform the actual calculation.
//!
//! All amounts are exact decimals. Callers holding floats convert them with
//! [`types::money::Money::from_f64`] and [`types::electricity::Kwh::from_f64`], which reject
//! `NaN` and infinities with [`Error::InvalidNumber`].

use std::fmt;

use input::tariff::TariffKey;
use types::time::BillingPeriod;

/// Plain input data: contract settings, meter readings and market prices.
pub mod input;

/// Module containing the functionality to invoice a single contract.
pub mod invoicer;

/// Named policy values that can be overridden by configuration.
pub mod policy;

pub mod advisor;
pub mod batch;
pub mod comparison;
pub mod composer;
pub mod demand;
pub mod projection;
pub mod rates;
pub mod reactive;
pub mod true_up;

/// Module for generating human readable invoices.
pub mod explain;

pub mod lint;

/// Numeric and time types used for calculations, serializing and deserializing.
pub mod types;

pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors when invoicing a contract.
#[derive(Debug)]
pub enum Error {
    /// No row of the tariff table matches the contract.
    TariffNotFound(TariffKey),
    /// More than one row of the tariff table matches the contract.
    AmbiguousTariff { key: TariffKey, matches: usize },
    /// A contract setting needed for the calculation is not configured.
    MissingSetting {
        contract_id: String,
        setting: &'static str,
    },
    /// The surcharge estimate of the period is not known. No total is computed without it.
    MissingSurchargeEstimate(BillingPeriod),
    /// No wholesale price has been published for the period yet.
    NoWholesalePrice(BillingPeriod),
    /// None of the consumption of the period could be matched with a wholesale price.
    NoBillableConsumption(BillingPeriod),
    /// A quantity or price that must not be negative was.
    NegativeValue(&'static str),
    /// A number was NaN or infinite.
    InvalidNumber(&'static str),
    InvalidPeriod { year: i32, month: u32 },
    InvalidPeriodFormat(String),
    /// A surcharge record of another period than the one reconciled was passed in.
    PeriodMismatch {
        expected: BillingPeriod,
        found: BillingPeriod,
    },
    /// A numeric overflow occurred during calculation.
    NumericOverflow,
}

/// The class of an [`Error`], which decides how a caller should treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The contract or tariff configuration is wrong; fatal for that contract.
    Configuration,
    /// Data the calculation needs is not available yet; the result is unavailable, retry later.
    InsufficientData,
    /// Input values were rejected before anything was composed.
    InvalidInput,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TariffNotFound(_) | Self::AmbiguousTariff { .. } | Self::MissingSetting { .. } => {
                ErrorKind::Configuration
            }
            Self::MissingSurchargeEstimate(_)
            | Self::NoWholesalePrice(_)
            | Self::NoBillableConsumption(_) => ErrorKind::InsufficientData,
            Self::NegativeValue(_)
            | Self::InvalidNumber(_)
            | Self::InvalidPeriod { .. }
            | Self::InvalidPeriodFormat(_)
            | Self::PeriodMismatch { .. }
            | Self::NumericOverflow => ErrorKind::InvalidInput,
        }
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(_: rust_decimal::Error) -> Self {
        Self::NumericOverflow
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TariffNotFound(key) => write!(f, "No tariff row found for `{key}`"),
            Self::AmbiguousTariff { key, matches } => {
                write!(f, "{matches} tariff rows match `{key}`, expected exactly one")
            }
            Self::MissingSetting {
                contract_id,
                setting,
            } => write!(f, "Contract `{contract_id}` has no `{setting}` configured"),
            Self::MissingSurchargeEstimate(period) => {
                write!(f, "No surcharge estimate is known for {period}")
            }
            Self::NoWholesalePrice(period) => {
                write!(f, "No wholesale price has been published for {period}")
            }
            Self::NoBillableConsumption(period) => {
                write!(f, "No consumption with a wholesale price in {period}")
            }
            Self::NegativeValue(field) => write!(f, "`{field}` must not be negative"),
            Self::InvalidNumber(field) => write!(f, "`{field}` is not a finite number"),
            Self::InvalidPeriod { year, month } => {
                write!(f, "{year}-{month:02} is not a valid billing period")
            }
            Self::InvalidPeriodFormat(text) => {
                write!(f, "`{text}` is not a billing period, expected `YYYY-MM`")
            }
            Self::PeriodMismatch { expected, found } => write!(
                f,
                "Surcharge record of {found} was given where {expected} was expected"
            ),
            Self::NumericOverflow => f.write_str("A numeric overflow occurred during calculation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};
    use crate::types::time::BillingPeriod;

    #[test]
    fn errors_are_classified() {
        let period = BillingPeriod::new(2024, 3).unwrap();

        assert_eq!(
            Error::MissingSetting {
                contract_id: "TR-1".into(),
                setting: "voltage_class"
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::NoWholesalePrice(period).kind(),
            ErrorKind::InsufficientData
        );
        assert_eq!(
            Error::NegativeValue("price").kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
    }
}
