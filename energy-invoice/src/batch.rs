//! Invoicing many contracts at once.
//!
//! Contracts are independent of each other: every contract gets its own outcome and an error in
//! one of them never affects the others.

use serde::Serialize;

use crate::{
    input::BillingInput,
    invoicer::{Invoice, Invoicer},
    policy::Policy,
    rates::TariffTable,
    types::time::{BillingPeriod, DateTime},
    Error, ErrorKind, Result,
};

/// The result of one contract in a batch.
#[derive(Debug)]
pub struct ContractOutcome<T> {
    pub contract_id: String,
    pub result: Result<T>,
}

impl<T> ContractOutcome<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A summary of a batch, e.g. for a fleet-wide overview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub configuration_errors: usize,
    pub insufficient_data: usize,
    pub invalid_input: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn of<T>(outcomes: &[ContractOutcome<T>]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match &outcome.result {
                    Ok(_) => summary.succeeded += 1,
                    Err(err) => match err.kind() {
                        ErrorKind::Configuration => summary.configuration_errors += 1,
                        ErrorKind::InsufficientData => summary.insufficient_data += 1,
                        ErrorKind::InvalidInput => summary.invalid_input += 1,
                    },
                }

                summary
            })
    }
}

/// Bill the closed `period` of every contract in `inputs`.
pub fn invoice_all(
    inputs: &[BillingInput],
    tariffs: &TariffTable,
    policy: &Policy,
    period: BillingPeriod,
) -> Vec<ContractOutcome<Invoice>> {
    run(inputs, tariffs, policy, |invoicer| invoicer.invoice(period))
}

/// Project the open period at `now` for every contract in `inputs`.
pub fn project_all(
    inputs: &[BillingInput],
    tariffs: &TariffTable,
    policy: &Policy,
    now: DateTime,
) -> Vec<ContractOutcome<Invoice>> {
    run(inputs, tariffs, policy, |invoicer| {
        invoicer.project_to_date(now)
    })
}

fn run<T>(
    inputs: &[BillingInput],
    tariffs: &TariffTable,
    policy: &Policy,
    calculate: impl Fn(&Invoicer<'_>) -> Result<T>,
) -> Vec<ContractOutcome<T>> {
    inputs
        .iter()
        .map(|input| {
            let invoicer = Invoicer::new(input, tariffs).with_policy(policy.clone());
            let result = calculate(&invoicer);

            if let Err(err) = &result {
                log_failure(&input.contract.id, err);
            }

            ContractOutcome {
                contract_id: input.contract.id.clone(),
                result,
            }
        })
        .collect()
}

fn log_failure(contract_id: &str, err: &Error) {
    tracing::warn!(contract = contract_id, kind = ?err.kind(), %err, "contract skipped");
}
