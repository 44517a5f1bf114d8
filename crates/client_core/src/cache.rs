use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    protocol::{Employee, PaginatedResult, Transaction},
};
use tracing::debug;

use crate::{error::FetchError, DataSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Employees,
    PaginatedTransactions,
    TransactionsByEmployee,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [
        Endpoint::Employees,
        Endpoint::PaginatedTransactions,
        Endpoint::TransactionsByEmployee,
    ];
}

#[derive(Default)]
struct ResponseCache {
    employees: Option<Vec<Employee>>,
    pages: HashMap<PageCursor, PaginatedResult<Transaction>>,
    by_employee: HashMap<EmployeeId, Vec<Transaction>>,
    /// Bumped on every clear; a response is only stored if its endpoint was
    /// not cleared while the request was outstanding.
    epochs: HashMap<Endpoint, u64>,
}

impl ResponseCache {
    fn clear(&mut self, endpoint: Endpoint) {
        match endpoint {
            Endpoint::Employees => self.employees = None,
            Endpoint::PaginatedTransactions => self.pages.clear(),
            Endpoint::TransactionsByEmployee => self.by_employee.clear(),
        }
        *self.epochs.entry(endpoint).or_default() += 1;
    }

    fn epoch(&self, endpoint: Endpoint) -> u64 {
        self.epochs.get(&endpoint).copied().unwrap_or_default()
    }
}

/// Memoizes successful read responses of another `DataSource`, keyed by
/// request. Failures pass through uncached. A successful approval update
/// drops every cached transaction response.
pub struct CachingDataSource<S> {
    inner: S,
    cache: Mutex<ResponseCache>,
}

impl<S: DataSource> CachingDataSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(ResponseCache::default()),
        }
    }

    pub fn clear_cache(&self) {
        self.clear_cache_by_endpoint(&Endpoint::ALL);
    }

    pub fn clear_cache_by_endpoint(&self, endpoints: &[Endpoint]) {
        let mut cache = self.cache();
        for endpoint in endpoints {
            cache.clear(*endpoint);
        }
        debug!(?endpoints, "cleared cached responses");
    }

    /// Runs `store` unless `endpoint` was cleared since `epoch` was read.
    fn store_if_current(
        &self,
        endpoint: Endpoint,
        epoch: u64,
        store: impl FnOnce(&mut ResponseCache),
    ) {
        let mut cache = self.cache();
        if cache.epoch(endpoint) == epoch {
            store(&mut *cache);
        } else {
            debug!(?endpoint, "not caching response to a request that outlived a clear");
        }
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachingDataSource<S> {
    async fn employees(&self) -> Result<Vec<Employee>, FetchError> {
        let (cached, epoch) = {
            let cache = self.cache();
            (cache.employees.clone(), cache.epoch(Endpoint::Employees))
        };
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let employees = self.inner.employees().await?;
        self.store_if_current(Endpoint::Employees, epoch, |cache| {
            cache.employees = Some(employees.clone());
        });
        Ok(employees)
    }

    async fn transactions_page(
        &self,
        cursor: PageCursor,
    ) -> Result<PaginatedResult<Transaction>, FetchError> {
        let (cached, epoch) = {
            let cache = self.cache();
            (
                cache.pages.get(&cursor).cloned(),
                cache.epoch(Endpoint::PaginatedTransactions),
            )
        };
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let page = self.inner.transactions_page(cursor).await?;
        self.store_if_current(Endpoint::PaginatedTransactions, epoch, |cache| {
            cache.pages.insert(cursor, page.clone());
        });
        Ok(page)
    }

    async fn transactions_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<Transaction>, FetchError> {
        let (cached, epoch) = {
            let cache = self.cache();
            (
                cache.by_employee.get(employee_id).cloned(),
                cache.epoch(Endpoint::TransactionsByEmployee),
            )
        };
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let transactions = self.inner.transactions_by_employee(employee_id).await?;
        self.store_if_current(Endpoint::TransactionsByEmployee, epoch, |cache| {
            cache
                .by_employee
                .insert(employee_id.clone(), transactions.clone());
        });
        Ok(transactions)
    }

    async fn set_transaction_approval(
        &self,
        transaction_id: &TransactionId,
        approved: bool,
    ) -> Result<(), FetchError> {
        self.inner
            .set_transaction_approval(transaction_id, approved)
            .await?;
        self.clear_cache_by_endpoint(&[
            Endpoint::PaginatedTransactions,
            Endpoint::TransactionsByEmployee,
        ]);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
