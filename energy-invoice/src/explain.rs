use crate::{
    invoicer::{Invoice, InvoiceKind},
    true_up::{Direction, TrueUp},
    types::money::Money,
};

#[derive(Debug)]
pub struct Explain {
    pub title: String,
    pub lines: Vec<ExplainLine>,
    pub notes: Vec<String>,
}

#[derive(Debug)]
pub struct ExplainLine {
    pub label: String,
    pub amount: Money,
}

impl ExplainLine {
    fn new(label: impl Into<String>, amount: Money) -> Self {
        Self {
            label: label.into(),
            amount: amount.with_scale(),
        }
    }
}

pub fn explain(invoice: &Invoice) -> Explain {
    let breakdown = &invoice.breakdown;

    let kind = match invoice.kind {
        InvoiceKind::Closed => "invoice",
        InvoiceKind::ToDate => "projection to date",
    };
    let title = format!(
        "{} {} ({}, {kind})",
        invoice.contract_id, invoice.period, invoice.classification
    );

    let mut lines: Vec<ExplainLine> = breakdown
        .lines()
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(line, amount)| ExplainLine::new(line.to_string(), amount))
        .collect();

    lines.push(ExplainLine::new("Subtotal", breakdown.subtotal));
    lines.push(ExplainLine::new(format!("VAT {}", breakdown.vat_rate), breakdown.vat));
    lines.push(ExplainLine::new("Total", breakdown.total));

    if let TrueUp::Available(true_up) = &invoice.true_up {
        lines.push(ExplainLine::new(
            explain_true_up(true_up.direction(), &true_up.reconciled_period.to_string()),
            true_up.amount,
        ));
        lines.push(ExplainLine::new("Payable", invoice.payable));
    }

    Explain {
        title,
        lines,
        notes: explain_notes(invoice),
    }
}

/// The label of a true-up line, which depends on who owes whom.
pub fn explain_true_up(direction: Direction, period: &str) -> String {
    match direction {
        Direction::Debit => format!("Surcharge true-up owed for {period}"),
        Direction::Credit => format!("Surcharge true-up credit for {period}"),
        Direction::Settled => format!("Surcharge true-up for {period} settled"),
    }
}

/// Explain everything about the invoice that is estimated, incomplete or missing.
pub fn explain_notes(invoice: &Invoice) -> Vec<String> {
    let mut notes = Vec::new();
    let coverage = &invoice.coverage;

    if let (InvoiceKind::ToDate, Some(cutoff)) = (invoice.kind, coverage.cutoff) {
        notes.push(format!("projected through {}", cutoff.format("%Y-%m-%d %H:00 UTC")));
    }

    if !coverage.is_complete() {
        notes.push(format!(
            "{} kWh in {} readings without a wholesale price is not billed",
            coverage.skipped_kwh.with_scale(),
            coverage.skipped_readings
        ));
    }

    if invoice.demand_missing() {
        notes.push("no finalized peak demand, power excess assumed zero".to_owned());
    }

    if invoice.reactive.is_penalized() {
        notes.push(format!(
            "reactive ratios {:.2}% inductive and {:.2}% capacitive exceed the limits",
            invoice.reactive.inductive_ratio, invoice.reactive.capacitive_ratio
        ));
    }

    if let TrueUp::Unavailable {
        reconciled_period,
        missing,
        ..
    } = &invoice.true_up
    {
        notes.push(format!(
            "surcharge true-up for {reconciled_period} unavailable: {missing}"
        ));
    }

    notes
}
