use std::{
    fs::File,
    path::{Path, PathBuf},
    process::exit,
};

use chrono::Utc;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use console::style;
use energy_invoice::{
    advisor::LimitAdvice,
    batch::{invoice_all, BatchSummary, ContractOutcome},
    comparison::Savings,
    explain::explain,
    input::BillingInput,
    invoicer::{Invoice, Invoicer},
    lint::lint,
    policy::Policy,
    rates::TariffTable,
    types::time::{BillingPeriod, DateTime},
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::{config::load_policy, error::Error, Result};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// A TOML file overriding the default policy values.
    #[arg(long, global = true, env = "ENERGY_INVOICE_POLICY")]
    policy: Option<PathBuf>,
    /// Time zone billing periods start and end in, overriding the policy.
    #[arg(short = 'z', long, global = true)]
    timezone: Option<Tz>,

    #[clap(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) {
        if let Err(err) = self.try_run() {
            eprintln!("{}", style(err).red());
            exit(1);
        }
    }

    fn try_run(self) -> Result<()> {
        let mut policy = load_policy(self.policy.as_deref())?;

        if let Some(time_zone) = self.timezone {
            policy.time_zone = time_zone;
        }

        self.command.run(&policy)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Invoice a closed billing period for one or more contracts.
    ///
    /// Every input file holds the data of a single contract. A contract that cannot be
    /// invoiced is reported and does not stop the others.
    Invoice(InvoiceCommand),
    /// Project the invoice of the open billing period through the latest priced hour.
    Project(Project),
    /// Price an invoice under the opposite tariff classification.
    Compare(Compare),
    /// Advise on the contracted power of a dual-rate contract.
    Advise(Advise),
    /// Check a tariff table for likely configuration mistakes.
    Lint(Lint),
}

impl Command {
    fn run(self, policy: &Policy) -> Result<()> {
        match self {
            Self::Invoice(args) => args.run(policy),
            Self::Project(args) => args.run(policy),
            Self::Compare(args) => args.run(policy),
            Self::Advise(args) => args.run(policy),
            Self::Lint(args) => args.run(),
        }
    }
}

#[derive(Debug, Args)]
pub struct TariffArgs {
    /// A path to the published tariff table in json format.
    #[arg(short = 't', long)]
    tariffs: PathBuf,
    /// Print the result as json instead of a table.
    #[arg(long)]
    json: bool,
}

impl TariffArgs {
    fn load_tariffs(&self) -> Result<TariffTable> {
        load_json(&self.tariffs, "tariff table")
    }
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// A path to the billing input of a contract in json format.
    #[arg(short = 'i', long)]
    input: PathBuf,
    #[command(flatten)]
    tariff: TariffArgs,
}

impl InputArgs {
    fn load_all(&self) -> Result<(BillingInput, TariffTable)> {
        Ok((
            load_json(&self.input, "billing input")?,
            self.tariff.load_tariffs()?,
        ))
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::file(path.to_path_buf(), e))?;
    serde_json::from_reader(&file).map_err(|e| Error::deserialize(path.display(), kind, e))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(Error::Serialize)?;
    println!("{json}");
    Ok(())
}

/// The period to bill when none is given: the last closed one.
fn period_or_last_closed(period: Option<BillingPeriod>, policy: &Policy) -> BillingPeriod {
    period.unwrap_or_else(|| BillingPeriod::last_closed(Utc::now(), policy.time_zone))
}

#[derive(Debug, Tabled)]
struct LineRow {
    #[tabled(rename = "Line")]
    label: String,
    #[tabled(rename = "Amount (TL)")]
    amount: String,
}

fn print_invoice(invoice: &Invoice) {
    let explain = explain(invoice);

    println!("{}", style(&explain.title).green());

    let rows = explain.lines.into_iter().map(|line| LineRow {
        label: line.label,
        amount: line.amount.to_string(),
    });

    println!("{}", Table::new(rows).with(Style::modern()).to_string());

    for note in explain.notes {
        println!("{} {note}", style("note:").yellow());
    }
}

#[derive(Debug, Parser)]
pub struct InvoiceCommand {
    /// Paths to billing inputs in json format, one contract per file.
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    /// The billing period as `YYYY-MM`. Defaults to the last closed period.
    #[arg(short = 'p', long)]
    period: Option<BillingPeriod>,
    #[command(flatten)]
    tariff: TariffArgs,
}

#[derive(Serialize)]
struct OutcomeJson<'a> {
    contract_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    invoice: Option<&'a Invoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a ContractOutcome<Invoice>> for OutcomeJson<'a> {
    fn from(outcome: &'a ContractOutcome<Invoice>) -> Self {
        Self {
            contract_id: &outcome.contract_id,
            invoice: outcome.result.as_ref().ok(),
            error: outcome.result.as_ref().err().map(ToString::to_string),
        }
    }
}

impl InvoiceCommand {
    fn run(self, policy: &Policy) -> Result<()> {
        let tariffs = self.tariff.load_tariffs()?;
        let inputs = self
            .inputs
            .iter()
            .map(|path| load_json(path, "billing input"))
            .collect::<Result<Vec<BillingInput>>>()?;

        let period = period_or_last_closed(self.period, policy);
        let outcomes = invoice_all(&inputs, &tariffs, policy, period);

        if self.tariff.json {
            let json: Vec<OutcomeJson<'_>> = outcomes.iter().map(OutcomeJson::from).collect();
            print_json(&json)?;
        } else {
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(invoice) => print_invoice(invoice),
                    Err(err) => println!(
                        "{} {}: {err}",
                        style("failed").red(),
                        outcome.contract_id
                    ),
                }
                println!();
            }
        }

        let summary = BatchSummary::of(&outcomes);
        let failed = outcomes.len() - summary.succeeded;

        if failed > 0 {
            return Err(Error::Batch {
                failed,
                total: outcomes.len(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Project {
    /// The moment to project at, in RFC 3339. Defaults to now.
    #[arg(long)]
    now: Option<DateTime>,
    #[command(flatten)]
    args: InputArgs,
}

impl Project {
    fn run(self, policy: &Policy) -> Result<()> {
        let (input, tariffs) = self.args.load_all()?;
        let now = self.now.unwrap_or_else(Utc::now);

        let projection = Invoicer::new(&input, &tariffs)
            .with_policy(policy.clone())
            .project_to_date(now)?;

        if self.args.tariff.json {
            print_json(&projection)
        } else {
            print_invoice(&projection);
            Ok(())
        }
    }
}

#[derive(Debug, Parser)]
pub struct Compare {
    /// The billing period as `YYYY-MM`. Defaults to the last closed period.
    #[arg(short = 'p', long)]
    period: Option<BillingPeriod>,
    #[command(flatten)]
    args: InputArgs,
}

#[derive(Debug, Tabled)]
struct CompareRow {
    #[tabled(rename = "Line")]
    label: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Alternate")]
    alternate: String,
}

impl Compare {
    fn run(self, policy: &Policy) -> Result<()> {
        let (input, tariffs) = self.args.load_all()?;
        let period = period_or_last_closed(self.period, policy);

        let invoicer = Invoicer::new(&input, &tariffs).with_policy(policy.clone());
        let invoice = invoicer.invoice(period)?;
        let comparison = invoicer.compare(&invoice)?;

        if self.args.tariff.json {
            return print_json(&comparison);
        }

        println!(
            "{} {} {} as {} instead of {}",
            style("Comparing").green(),
            invoice.contract_id,
            period,
            comparison.alternate_key,
            comparison.actual_classification,
        );

        let mut rows: Vec<CompareRow> = invoice
            .breakdown
            .lines()
            .into_iter()
            .zip(comparison.alternate.lines())
            .map(|((line, actual), (_, alternate))| CompareRow {
                label: line.to_string(),
                actual: actual.to_string(),
                alternate: alternate.to_string(),
            })
            .collect();

        rows.push(CompareRow {
            label: "Total".into(),
            actual: invoice.breakdown.total.to_string(),
            alternate: comparison.alternate.total.to_string(),
        });

        println!("{}", Table::new(rows).with(Style::modern()).to_string());

        if let Some(limit) = comparison.synthetic_limit_kw {
            println!(
                "{} contracted power assumed at {limit} kW",
                style("note:").yellow()
            );
        }

        match comparison.savings {
            Savings::AlreadyOptimal => println!("{}", style("current tariff already optimal").green()),
            Savings::Saves(amount) => println!(
                "{} {amount} TL per period",
                style("switching would save").yellow()
            ),
        }

        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Advise {
    /// The latest period to take demand history from. Defaults to the last closed period.
    #[arg(short = 'p', long)]
    period: Option<BillingPeriod>,
    #[command(flatten)]
    args: InputArgs,
}

impl Advise {
    fn run(self, policy: &Policy) -> Result<()> {
        let (input, tariffs) = self.args.load_all()?;
        let period = period_or_last_closed(self.period, policy);

        let advice = Invoicer::new(&input, &tariffs)
            .with_policy(policy.clone())
            .advise_limit(period)?;

        if self.args.tariff.json {
            return print_json(&advice);
        }

        for (period, peak) in &advice.recent_peaks {
            println!("{period}: peak {peak} kW");
        }

        let message = match advice.advice {
            LimitAdvice::NotApplicable => style("single-rate contract, no contracted power".to_owned()),
            LimitAdvice::InsufficientData => {
                style("not enough finalized demand data or no overage price".to_owned()).yellow()
            }
            LimitAdvice::Increase {
                contracted_kw,
                observed_peak_kw,
            } => style(format!(
                "increase: peak {observed_peak_kw} kW reached the contracted {contracted_kw} kW"
            ))
            .red(),
            LimitAdvice::Optimal {
                contracted_kw,
                observed_peak_kw,
                ..
            } => style(format!(
                "already optimal: {contracted_kw} kW for a peak of {observed_peak_kw} kW"
            ))
            .green(),
            LimitAdvice::Decrease {
                contracted_kw,
                recommended_kw,
                estimated_monthly_saving,
                ..
            } => style(format!(
                "decrease from {contracted_kw} kW to {recommended_kw} kW, \
                 saving about {estimated_monthly_saving} TL per month"
            ))
            .yellow(),
        };

        println!("{message}");

        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Lint {
    /// A path to the published tariff table in json format.
    #[arg(short = 't', long)]
    tariffs: PathBuf,
}

impl Lint {
    fn run(self) -> Result<()> {
        let tariffs: TariffTable = load_json(&self.tariffs, "tariff table")?;
        let warnings = lint(&tariffs);

        if warnings.is_empty() {
            println!("{}", style("no warnings").green());
        }

        for warning in warnings {
            println!("{} {warning}", style("warning:").yellow());
        }

        Ok(())
    }
}
