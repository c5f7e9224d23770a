//! TTL-cached facade over the four upstream sources.
//!
//! Failure policy, in order: serve a fresh cache entry without fetching;
//! refresh on expiry; on refresh failure serve the last good value; with no
//! cached value at all, hand back the type-correct empty collection so the
//! analysis pass never sees an error or a null.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use salesradar_core::domain::action::ClientActionRecord;
use salesradar_core::domain::directory::ManagerDirectory;
use salesradar_core::domain::employee::EmployeeDirectory;
use salesradar_core::domain::sale::{ClientCode, Sale};
use salesradar_core::pipeline::AnalysisInputs;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::sources::{
    ActionRecordSource, DirectorySource, EmployeeSource, SalesSource, SourceError,
};
use crate::tokens::TokenGate;

const SALES_KEY: &str = "sales";
const DIRECTORY_KEY: &str = "directory";
const EMPLOYEES_KEY: &str = "employees";
const ACTIONS_KEY: &str = "actions";

#[derive(Clone, Copy, Debug)]
pub struct DataProviderConfig {
    pub ttl: std::time::Duration,
}

impl Default for DataProviderConfig {
    fn default() -> Self {
        Self { ttl: std::time::Duration::from_secs(300) }
    }
}

pub struct CachedDataProvider<C: Clock = SystemClock> {
    sales_source: Arc<dyn SalesSource>,
    directory_source: Arc<dyn DirectorySource>,
    employee_source: Arc<dyn EmployeeSource>,
    action_source: Arc<dyn ActionRecordSource>,
    clock: Arc<C>,
    tokens: TokenGate,
    sales_cache: TtlCache<&'static str, Vec<Sale>>,
    directory_cache: TtlCache<&'static str, ManagerDirectory>,
    employee_cache: TtlCache<&'static str, EmployeeDirectory>,
    action_cache: TtlCache<&'static str, BTreeMap<ClientCode, ClientActionRecord>>,
}

impl CachedDataProvider<SystemClock> {
    pub fn new(
        config: DataProviderConfig,
        sales_source: Arc<dyn SalesSource>,
        directory_source: Arc<dyn DirectorySource>,
        employee_source: Arc<dyn EmployeeSource>,
        action_source: Arc<dyn ActionRecordSource>,
    ) -> Self {
        Self::with_clock(
            config,
            sales_source,
            directory_source,
            employee_source,
            action_source,
            Arc::new(SystemClock),
        )
    }
}

impl<C: Clock> CachedDataProvider<C> {
    /// Injectable clock so tests can drive TTL expiry deterministically.
    pub fn with_clock(
        config: DataProviderConfig,
        sales_source: Arc<dyn SalesSource>,
        directory_source: Arc<dyn DirectorySource>,
        employee_source: Arc<dyn EmployeeSource>,
        action_source: Arc<dyn ActionRecordSource>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            sales_source,
            directory_source,
            employee_source,
            action_source,
            clock,
            tokens: TokenGate::new(),
            sales_cache: TtlCache::new(config.ttl),
            directory_cache: TtlCache::new(config.ttl),
            employee_cache: TtlCache::new(config.ttl),
            action_cache: TtlCache::new(config.ttl),
        }
    }

    pub async fn sales(&self) -> Vec<Sale> {
        self.load(SALES_KEY, &self.sales_cache, self.sales_source.fetch_sales()).await
    }

    pub async fn directory(&self) -> ManagerDirectory {
        self.load(DIRECTORY_KEY, &self.directory_cache, self.directory_source.fetch_directory())
            .await
    }

    pub async fn employees(&self) -> EmployeeDirectory {
        self.load(EMPLOYEES_KEY, &self.employee_cache, self.employee_source.fetch_employees())
            .await
    }

    pub async fn actions(&self) -> BTreeMap<ClientCode, ClientActionRecord> {
        self.load(ACTIONS_KEY, &self.action_cache, self.action_source.fetch_actions()).await
    }

    /// The full immutable snapshot one analysis pass computes over.
    pub async fn snapshot(&self) -> AnalysisInputs {
        AnalysisInputs {
            sales: self.sales().await,
            directory: self.directory().await,
            employees: self.employees().await,
            actions: self.actions().await,
        }
    }

    pub async fn invalidate(&self) {
        self.sales_cache.clear().await;
        self.directory_cache.clear().await;
        self.employee_cache.clear().await;
        self.action_cache.clear().await;
    }

    async fn load<T, Fut>(
        &self,
        key: &'static str,
        cache: &TtlCache<&'static str, T>,
        fetch: Fut,
    ) -> T
    where
        T: Clone + Default,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let now = self.clock.now();
        if let Some(fresh) = cache.get_fresh(&key, now).await {
            return fresh;
        }

        let token = self.tokens.issue(key).await;
        match fetch.await {
            Ok(value) => {
                if self.tokens.is_current(key, token).await {
                    cache.insert(key, value.clone(), self.clock.now()).await;
                    value
                } else {
                    // A newer refresh finished first; its result wins.
                    cache.get_any(&key).await.unwrap_or(value)
                }
            }
            Err(error) => match cache.get_any(&key).await {
                Some(stale) => {
                    warn!(
                        event_name = "data.fetch.stale_served",
                        dataset = key,
                        error = %error,
                        "refresh failed, serving last good value"
                    );
                    stale
                }
                None => {
                    warn!(
                        event_name = "data.fetch.empty_fallback",
                        dataset = key,
                        error = %error,
                        "refresh failed with no cached value, serving empty dataset"
                    );
                    T::default()
                }
            },
        }
    }
}
