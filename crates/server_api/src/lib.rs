use std::sync::Arc;

use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    error::ApiError,
    protocol::{Employee, PaginatedResult, Transaction},
};
use tokio::sync::RwLock;
use tracing::debug;

mod ledger;

pub use ledger::{Ledger, LedgerError};

pub const TRANSACTIONS_PER_PAGE: usize = 5;

#[derive(Clone)]
pub struct ApiContext {
    pub ledger: Arc<RwLock<Ledger>>,
    pub transactions_per_page: usize,
}

impl ApiContext {
    pub fn new(ledger: Ledger, transactions_per_page: usize) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            transactions_per_page: transactions_per_page.max(1),
        }
    }
}

pub async fn list_employees(ctx: &ApiContext) -> Result<Vec<Employee>, ApiError> {
    Ok(ctx.ledger.read().await.employees().to_vec())
}

pub async fn list_transactions_page(
    ctx: &ApiContext,
    page: PageCursor,
) -> Result<PaginatedResult<Transaction>, ApiError> {
    let ledger = ctx.ledger.read().await;
    let transactions = ledger.transactions();
    let per_page = ctx.transactions_per_page;

    let start = (page.index() as usize)
        .checked_mul(per_page)
        .filter(|start| *start <= transactions.len())
        .ok_or_else(|| ApiError::validation(format!("invalid page {page}")))?;
    let end = (start + per_page).min(transactions.len());

    let next_page = if end < transactions.len() {
        Some(PageCursor(page.index() + 1))
    } else {
        None
    };
    debug!(%page, start, end, "serving transactions page");

    Ok(PaginatedResult {
        data: transactions[start..end].to_vec(),
        next_page,
    })
}

pub async fn list_transactions_for_employee(
    ctx: &ApiContext,
    employee_id: &EmployeeId,
) -> Result<Vec<Transaction>, ApiError> {
    if employee_id.is_empty() {
        return Err(ApiError::validation("employee id cannot be empty"));
    }

    let ledger = ctx.ledger.read().await;
    if ledger.employee(employee_id).is_none() {
        return Err(ApiError::not_found(format!(
            "employee {employee_id} not found"
        )));
    }

    Ok(ledger
        .transactions()
        .iter()
        .filter(|t| &t.employee.id == employee_id)
        .cloned()
        .collect())
}

pub async fn set_transaction_approval(
    ctx: &ApiContext,
    transaction_id: &TransactionId,
    approved: bool,
) -> Result<(), ApiError> {
    let mut ledger = ctx.ledger.write().await;
    let transaction = ledger
        .transaction_mut(transaction_id)
        .ok_or_else(|| ApiError::not_found(format!("transaction {transaction_id} not found")))?;
    transaction.approved = approved;
    debug!(%transaction_id, approved, "transaction approval updated");
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
