use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    protocol::{Employee, PaginatedResult, Transaction},
};

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod pagination;
pub mod resources;
pub mod store;

pub use cache::{CachingDataSource, Endpoint};
pub use coordinator::{Authoritative, DashboardEvent, DashboardView, ViewCoordinator};
pub use error::FetchError;
pub use http::{BaseUrlError, HttpDataSource};
pub use pagination::PaginatedTransactionsResource;
pub use resources::{EmployeesResource, TransactionsByEmployeeResource};
pub use store::{FetchOutcome, ResourceState, ResourceStore};

/// Data-access layer behind the dashboard's resource stores.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn employees(&self) -> Result<Vec<Employee>, FetchError>;
    async fn transactions_page(
        &self,
        cursor: PageCursor,
    ) -> Result<PaginatedResult<Transaction>, FetchError>;
    async fn transactions_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<Transaction>, FetchError>;
    async fn set_transaction_approval(
        &self,
        transaction_id: &TransactionId,
        approved: bool,
    ) -> Result<(), FetchError>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn employees(&self) -> Result<Vec<Employee>, FetchError> {
        (**self).employees().await
    }

    async fn transactions_page(
        &self,
        cursor: PageCursor,
    ) -> Result<PaginatedResult<Transaction>, FetchError> {
        (**self).transactions_page(cursor).await
    }

    async fn transactions_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<Transaction>, FetchError> {
        (**self).transactions_by_employee(employee_id).await
    }

    async fn set_transaction_approval(
        &self,
        transaction_id: &TransactionId,
        approved: bool,
    ) -> Result<(), FetchError> {
        (**self)
            .set_transaction_approval(transaction_id, approved)
            .await
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
