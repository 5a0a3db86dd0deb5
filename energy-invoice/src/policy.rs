//! Policy constants that are not part of the published tariffs.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    advisor::{ADVISOR_BUFFER_RATIO, ADVISOR_WINDOW},
    comparison::SYNTHETIC_LIMIT_HEADROOM,
    input::contract::TariffClassification,
    reactive::ReactiveLimits,
};

/// The time zone billing periods start and end in.
pub const BILLING_TIME_ZONE: Tz = Tz::Europe__Istanbul;

/// Knobs of the engine. Every field has a default, so a partial configuration file is enough.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    /// Inductive to active energy ratio, in percent, above which reactive energy is penalized.
    pub inductive_limit_percent: Decimal,

    /// Capacitive to active energy ratio, in percent, above which reactive energy is penalized.
    pub capacitive_limit_percent: Decimal,

    /// Multiplier on observed peak demand used as contracted power when a single-rate contract
    /// is priced as dual-rate.
    pub synthetic_limit_headroom: Decimal,

    /// Safety margin of the contracted power advice, as a fraction of the observed peak.
    pub advisor_buffer_ratio: Decimal,

    /// Number of recent periods the contracted power advice looks at.
    pub advisor_window: usize,

    pub time_zone: Tz,

    /// Voltage classes that are named differently in the single- and dual-rate tables.
    pub voltage_counterparts: Vec<VoltageCounterpart>,
}

impl Default for Policy {
    fn default() -> Self {
        let limits = ReactiveLimits::default();

        Self {
            inductive_limit_percent: limits.inductive_percent,
            capacitive_limit_percent: limits.capacitive_percent,
            synthetic_limit_headroom: SYNTHETIC_LIMIT_HEADROOM,
            advisor_buffer_ratio: ADVISOR_BUFFER_RATIO,
            advisor_window: ADVISOR_WINDOW,
            time_zone: BILLING_TIME_ZONE,
            voltage_counterparts: Vec::new(),
        }
    }
}

impl Policy {
    #[must_use]
    pub fn reactive_limits(&self) -> ReactiveLimits {
        ReactiveLimits {
            inductive_percent: self.inductive_limit_percent,
            capacitive_percent: self.capacitive_limit_percent,
        }
    }

    /// The voltage class to look up in the `target` table for a contract on `voltage_class`.
    ///
    /// Classes without an entry keep their name.
    #[must_use]
    pub fn counterpart_voltage<'a>(
        &'a self,
        voltage_class: &'a str,
        target: TariffClassification,
    ) -> &'a str {
        let voltage = voltage_class.trim();

        self.voltage_counterparts
            .iter()
            .find_map(|pair| match target {
                TariffClassification::Dual if pair.single.eq_ignore_ascii_case(voltage) => {
                    Some(pair.dual.as_str())
                }
                TariffClassification::Single if pair.dual.eq_ignore_ascii_case(voltage) => {
                    Some(pair.single.as_str())
                }
                _ => None,
            })
            .unwrap_or(voltage_class)
    }
}

/// A voltage class as named in the single-rate table and in the dual-rate table.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VoltageCounterpart {
    pub single: String,
    pub dual: String,
}
