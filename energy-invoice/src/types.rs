/// Types for active energy, reactive energy and power.
pub mod electricity;

/// Money amounts, unit prices and tax rates.
pub mod money;

pub(crate) mod number;

/// Billing periods, time windows and hour alignment.
pub mod time;
