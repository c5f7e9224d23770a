//! Async ports to the upstream stores.
//!
//! The engine never talks to a transport directly; it consumes these traits.
//! The in-memory implementations back tests and the CLI's fixture files, and
//! mark the seam where a real transport would plug in.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use salesradar_core::domain::action::ClientActionRecord;
use salesradar_core::domain::directory::ManagerDirectory;
use salesradar_core::domain::employee::EmployeeDirectory;
use salesradar_core::domain::sale::{ClientCode, Sale};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream fetch failed: {0}")]
    Fetch(String),
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SalesSource: Send + Sync {
    async fn fetch_sales(&self) -> Result<Vec<Sale>, SourceError>;
}

#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch_directory(&self) -> Result<ManagerDirectory, SourceError>;
}

#[async_trait]
pub trait EmployeeSource: Send + Sync {
    async fn fetch_employees(&self) -> Result<EmployeeDirectory, SourceError>;
}

#[async_trait]
pub trait ActionRecordSource: Send + Sync {
    async fn fetch_actions(&self)
        -> Result<BTreeMap<ClientCode, ClientActionRecord>, SourceError>;
}

#[derive(Default)]
pub struct InMemorySalesSource {
    sales: RwLock<Vec<Sale>>,
}

impl InMemorySalesSource {
    pub fn new(sales: Vec<Sale>) -> Self {
        Self { sales: RwLock::new(sales) }
    }

    pub async fn replace(&self, sales: Vec<Sale>) {
        *self.sales.write().await = sales;
    }
}

#[async_trait]
impl SalesSource for InMemorySalesSource {
    async fn fetch_sales(&self) -> Result<Vec<Sale>, SourceError> {
        Ok(self.sales.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDirectorySource {
    directory: RwLock<ManagerDirectory>,
}

impl InMemoryDirectorySource {
    pub fn new(directory: ManagerDirectory) -> Self {
        Self { directory: RwLock::new(directory) }
    }

    pub async fn replace(&self, directory: ManagerDirectory) {
        *self.directory.write().await = directory;
    }
}

#[async_trait]
impl DirectorySource for InMemoryDirectorySource {
    async fn fetch_directory(&self) -> Result<ManagerDirectory, SourceError> {
        Ok(self.directory.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeSource {
    employees: RwLock<EmployeeDirectory>,
}

impl InMemoryEmployeeSource {
    pub fn new(employees: EmployeeDirectory) -> Self {
        Self { employees: RwLock::new(employees) }
    }
}

#[async_trait]
impl EmployeeSource for InMemoryEmployeeSource {
    async fn fetch_employees(&self) -> Result<EmployeeDirectory, SourceError> {
        Ok(self.employees.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryActionRecordSource {
    actions: RwLock<BTreeMap<ClientCode, ClientActionRecord>>,
}

impl InMemoryActionRecordSource {
    pub fn new(actions: BTreeMap<ClientCode, ClientActionRecord>) -> Self {
        Self { actions: RwLock::new(actions) }
    }

    /// Action records are mutated outside the engine; the store re-reads
    /// before the next pass, so replacement is the only write we model.
    pub async fn replace(&self, actions: BTreeMap<ClientCode, ClientActionRecord>) {
        *self.actions.write().await = actions;
    }
}

#[async_trait]
impl ActionRecordSource for InMemoryActionRecordSource {
    async fn fetch_actions(
        &self,
    ) -> Result<BTreeMap<ClientCode, ClientActionRecord>, SourceError> {
        Ok(self.actions.read().await.clone())
    }
}

/// Test double with a scripted sequence of responses; once the script is
/// exhausted every fetch fails. Drives the cache failure-policy tests.
#[derive(Default)]
pub struct ScriptedSalesSource {
    responses: Mutex<VecDeque<Result<Vec<Sale>, SourceError>>>,
}

impl ScriptedSalesSource {
    pub fn new(responses: Vec<Result<Vec<Sale>, SourceError>>) -> Self {
        Self { responses: Mutex::new(responses.into()) }
    }
}

#[async_trait]
impl SalesSource for ScriptedSalesSource {
    async fn fetch_sales(&self) -> Result<Vec<Sale>, SourceError> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Fetch("scripted responses exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use salesradar_core::domain::sale::{ClientCode, Sale};

    use super::{InMemorySalesSource, SalesSource, ScriptedSalesSource, SourceError};

    fn sale(code: &str) -> Sale {
        Sale {
            client_code: ClientCode(code.to_string()),
            client_name: format!("Client {code}"),
            manager_name: "Anna".to_string(),
            date: Utc::now(),
            revenue: Decimal::new(100, 0),
            sphere: None,
            product: None,
        }
    }

    #[tokio::test]
    async fn in_memory_source_serves_replaced_data() {
        let source = InMemorySalesSource::new(vec![sale("C-1")]);
        assert_eq!(source.fetch_sales().await.unwrap().len(), 1);

        source.replace(vec![sale("C-1"), sale("C-2")]).await;
        assert_eq!(source.fetch_sales().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scripted_source_replays_then_fails() {
        let source = ScriptedSalesSource::new(vec![
            Ok(vec![sale("C-1")]),
            Err(SourceError::Fetch("boom".to_string())),
        ]);

        assert!(source.fetch_sales().await.is_ok());
        assert!(source.fetch_sales().await.is_err());
        assert!(source.fetch_sales().await.is_err());
    }
}
