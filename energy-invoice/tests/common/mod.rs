use std::{
    fs::{read_dir, File},
    path::PathBuf,
};

use energy_invoice::{
    input::BillingInput,
    invoicer::Invoicer,
    rates::TariffTable,
    types::{money::Money, time::BillingPeriod},
};
use serde::Deserialize;

pub struct JsonTest {
    pub path: PathBuf,
    pub tariffs: TariffTable,
    pub cases: Vec<(String, Case)>,
}

/// One contract to invoice, with the amounts the invoice must come to.
#[derive(Deserialize)]
pub struct Case {
    pub period: BillingPeriod,
    pub input: BillingInput,
    pub expected: Expected,
}

#[derive(Deserialize)]
pub struct Expected {
    pub subtotal: Money,
    pub total: Money,
    /// `None` when the true-up is expected to be unavailable.
    pub true_up: Option<Money>,
    pub payable: Money,
    #[serde(default)]
    pub demand_missing: bool,
}

pub fn collect_json_tests() -> Result<Vec<JsonTest>, Box<dyn std::error::Error>> {
    let mut tests = Vec::new();

    for test_dir in read_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/resources"))? {
        let test_dir_path = test_dir?.path();

        if !test_dir_path.is_dir() {
            continue;
        }

        let mut tariffs = None;
        let mut cases = Vec::new();

        for json_file in read_dir(&test_dir_path)? {
            let file_path = json_file?.path();

            if file_path.extension().unwrap() != "json" {
                continue;
            }

            let file_stem = file_path.file_stem().unwrap();
            if file_stem == "tariffs" {
                tariffs = Some(serde_json::from_reader(File::open(file_path)?)?);
            } else {
                cases.push((
                    file_stem.to_string_lossy().to_string(),
                    serde_json::from_reader(File::open(file_path)?)?,
                ));
            }
        }

        tests.push(JsonTest {
            tariffs: tariffs
                .unwrap_or_else(|| panic!("no tariffs.json in test directory {test_dir_path:?}")),
            cases,
            path: test_dir_path,
        });
    }

    Ok(tests)
}

#[macro_export]
macro_rules! tariffs {
    ($name:literal) => {
        serde_json::from_str::<'_, energy_invoice::rates::TariffTable>(include_str!(concat!(
            "../resources/",
            $name,
            "/tariffs.json"
        )))
        .unwrap()
    };
}

#[macro_export]
macro_rules! case {
    ($dir:literal, $name:literal) => {
        serde_json::from_str::<'_, $crate::common::Case>(include_str!(concat!(
            "../resources/",
            $dir,
            "/",
            $name,
            ".json"
        )))
        .unwrap()
    };
}

pub fn validate_case(case: &Case, tariffs: &TariffTable) -> Result<(), energy_invoice::Error> {
    let invoice = Invoicer::new(&case.input, tariffs).invoice(case.period)?;
    let expected = &case.expected;

    assert_eq!(expected.subtotal, invoice.breakdown.subtotal, "subtotal");
    assert_eq!(expected.total, invoice.breakdown.total, "total");
    assert_eq!(
        expected.true_up,
        invoice
            .true_up
            .is_available()
            .then(|| invoice.true_up.amount()),
        "true_up"
    );
    assert_eq!(expected.payable, invoice.payable, "payable");
    assert_eq!(
        expected.demand_missing,
        invoice.demand_missing(),
        "demand_missing"
    );

    Ok(())
}
