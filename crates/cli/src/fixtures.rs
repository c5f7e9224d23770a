//! JSON fixture loading.
//!
//! A fixture directory mirrors the upstream datasets: `sales.json` (wire
//! records with locale-formatted revenue), `directory.json`,
//! `employees.json`, and `actions.json`. Only the ledger is mandatory;
//! a missing optional file behaves like an empty upstream dataset.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use salesradar_core::domain::action::ClientActionRecord;
use salesradar_core::domain::directory::{DirectoryEntry, ManagerDirectory};
use salesradar_core::domain::employee::{Employee, EmployeeDirectory};
use salesradar_core::domain::sale::{ClientCode, Sale, SaleRecord};

#[derive(Debug)]
pub struct FixtureSet {
    pub sales: Vec<Sale>,
    pub directory: ManagerDirectory,
    pub employees: EmployeeDirectory,
    pub actions: BTreeMap<ClientCode, ClientActionRecord>,
}

pub fn load(dir: &Path) -> Result<FixtureSet> {
    if !dir.is_dir() {
        bail!("fixture directory `{}` does not exist", dir.display());
    }

    let records: Vec<SaleRecord> = read_json(&dir.join("sales.json"))?
        .with_context(|| format!("`{}` must contain sales.json", dir.display()))?;
    let sales = records.into_iter().map(Sale::from_record).collect();

    let directory_entries: Vec<DirectoryEntry> =
        read_json(&dir.join("directory.json"))?.unwrap_or_default();
    let employees: Vec<Employee> = read_json(&dir.join("employees.json"))?.unwrap_or_default();
    let action_records: Vec<ClientActionRecord> =
        read_json(&dir.join("actions.json"))?.unwrap_or_default();

    Ok(FixtureSet {
        sales,
        directory: ManagerDirectory::from_entries(directory_entries),
        employees: EmployeeDirectory::new(employees),
        actions: action_records
            .into_iter()
            .map(|record| (record.client_code.clone(), record))
            .collect(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read fixture `{}`", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse fixture `{}`", path.display()))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::load;

    #[test]
    fn loads_sales_and_tolerates_missing_optional_fixtures() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sales.json"),
            r#"[
                {
                    "client_code": "C-1",
                    "client_name": "Vector LLC",
                    "manager_name": "Anna Petrova",
                    "date": "2026-06-01T00:00:00Z",
                    "revenue": "1 000,50"
                }
            ]"#,
        )
        .unwrap();

        let fixtures = load(dir.path()).unwrap();

        assert_eq!(fixtures.sales.len(), 1);
        assert_eq!(fixtures.sales[0].revenue, rust_decimal::Decimal::new(100_050, 2));
        assert!(fixtures.directory.is_empty());
        assert!(fixtures.actions.is_empty());
    }

    #[test]
    fn missing_sales_fixture_is_an_error() {
        let dir = TempDir::new().unwrap();
        let error = load(dir.path()).unwrap_err();
        assert!(error.to_string().contains("sales.json"));
    }

    #[test]
    fn malformed_fixture_reports_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sales.json"), "not json").unwrap();

        let error = load(dir.path()).unwrap_err();
        assert!(error.to_string().contains("sales.json"));
    }
}
