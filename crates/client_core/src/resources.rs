use std::sync::Arc;

use shared::{
    domain::EmployeeId,
    protocol::{Employee, Transaction},
};

use crate::{
    error::FetchError,
    store::{replace, FetchOutcome, ResourceState, ResourceStore},
    DataSource,
};

pub struct EmployeesResource {
    source: Arc<dyn DataSource>,
    store: ResourceStore<Vec<Employee>>,
}

impl EmployeesResource {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            store: ResourceStore::new("employees"),
        }
    }

    pub fn store(&self) -> &ResourceStore<Vec<Employee>> {
        &self.store
    }

    pub fn state(&self) -> ResourceState<Vec<Employee>> {
        self.store.snapshot()
    }

    pub async fn fetch_all(&self) -> Result<FetchOutcome, FetchError> {
        self.store
            .fetch_with(self.source.employees(), replace)
            .await
    }

    pub fn invalidate_data(&self) {
        self.store.invalidate_data();
    }
}

/// Transactions of one employee. Each fetch replaces whatever employee's
/// list was cached before.
pub struct TransactionsByEmployeeResource {
    source: Arc<dyn DataSource>,
    store: ResourceStore<Vec<Transaction>>,
}

impl TransactionsByEmployeeResource {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            store: ResourceStore::new("transactions_by_employee"),
        }
    }

    pub fn store(&self) -> &ResourceStore<Vec<Transaction>> {
        &self.store
    }

    pub fn state(&self) -> ResourceState<Vec<Transaction>> {
        self.store.snapshot()
    }

    pub async fn fetch_by_id(&self, employee_id: &EmployeeId) -> Result<FetchOutcome, FetchError> {
        self.store
            .fetch_with(self.source.transactions_by_employee(employee_id), replace)
            .await
    }

    pub fn invalidate_data(&self) {
        self.store.invalidate_data();
    }
}
