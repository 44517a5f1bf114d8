use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    protocol::{Employee, PaginatedResult, Transaction},
};
use tokio::sync::oneshot;

use crate::{error::FetchError, DataSource};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Employees,
    Page(PageCursor),
    ByEmployee(EmployeeId),
    Approval(TransactionId, bool),
}

enum Scripted<T> {
    Ready(Result<T, FetchError>),
    Gated(oneshot::Receiver<Result<T, FetchError>>),
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, FetchError> {
        match self {
            Scripted::Ready(result) => result,
            Scripted::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".into()))),
        }
    }
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

/// `DataSource` answering from per-endpoint queues of canned or gated
/// responses, recording every call it receives.
#[derive(Default)]
pub(crate) struct ScriptedDataSource {
    employees: Queue<Vec<Employee>>,
    pages: Queue<PaginatedResult<Transaction>>,
    by_employee: Queue<Vec<Transaction>>,
    approvals: Queue<()>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedDataSource {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_employees(&self, result: Result<Vec<Employee>, FetchError>) {
        push(&self.employees, Scripted::Ready(result));
    }

    pub(crate) fn push_page(&self, result: Result<PaginatedResult<Transaction>, FetchError>) {
        push(&self.pages, Scripted::Ready(result));
    }

    pub(crate) fn push_by_employee(&self, result: Result<Vec<Transaction>, FetchError>) {
        push(&self.by_employee, Scripted::Ready(result));
    }

    pub(crate) fn push_approval(&self, result: Result<(), FetchError>) {
        push(&self.approvals, Scripted::Ready(result));
    }

    pub(crate) fn gate_page(&self) -> oneshot::Sender<Result<PaginatedResult<Transaction>, FetchError>> {
        let (tx, rx) = oneshot::channel();
        push(&self.pages, Scripted::Gated(rx));
        tx
    }

    pub(crate) fn gate_by_employee(&self) -> oneshot::Sender<Result<Vec<Transaction>, FetchError>> {
        let (tx, rx) = oneshot::channel();
        push(&self.by_employee, Scripted::Gated(rx));
        tx
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    /// Yields until at least `n` calls reached the source.
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }
}

fn push<T>(queue: &Queue<T>, scripted: Scripted<T>) {
    queue.lock().expect("queue").push_back(scripted);
}

async fn next<T>(queue: &Queue<T>, what: &str) -> Result<T, FetchError> {
    let scripted = queue.lock().expect("queue").pop_front();
    match scripted {
        Some(scripted) => scripted.resolve().await,
        None => Err(FetchError::Network(format!("no scripted {what} response"))),
    }
}

#[async_trait]
impl DataSource for ScriptedDataSource {
    async fn employees(&self) -> Result<Vec<Employee>, FetchError> {
        self.record(Call::Employees);
        next(&self.employees, "employees").await
    }

    async fn transactions_page(
        &self,
        cursor: PageCursor,
    ) -> Result<PaginatedResult<Transaction>, FetchError> {
        self.record(Call::Page(cursor));
        next(&self.pages, "page").await
    }

    async fn transactions_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<Transaction>, FetchError> {
        self.record(Call::ByEmployee(employee_id.clone()));
        next(&self.by_employee, "by-employee").await
    }

    async fn set_transaction_approval(
        &self,
        transaction_id: &TransactionId,
        approved: bool,
    ) -> Result<(), FetchError> {
        self.record(Call::Approval(transaction_id.clone(), approved));
        next(&self.approvals, "approval").await
    }
}

pub(crate) fn employee(id: &str, first_name: &str, last_name: &str) -> Employee {
    Employee {
        id: EmployeeId::from(id),
        first_name: first_name.into(),
        last_name: last_name.into(),
    }
}

pub(crate) fn tx(id: &str) -> Transaction {
    tx_for(id, &employee("1", "A", "B"))
}

pub(crate) fn tx_for(id: &str, owner: &Employee) -> Transaction {
    Transaction {
        id: TransactionId::from(id),
        amount: 12.5,
        employee: owner.clone(),
        merchant: "Office Depot".into(),
        date: NaiveDate::from_ymd_opt(2022, 1, 3).expect("date"),
        approved: false,
    }
}

pub(crate) fn page(ids: &[&str], next_page: Option<u32>) -> PaginatedResult<Transaction> {
    PaginatedResult {
        data: ids.iter().map(|id| tx(id)).collect(),
        next_page: next_page.map(PageCursor),
    }
}

pub(crate) fn ids(transactions: &[Transaction]) -> Vec<&str> {
    transactions.iter().map(|t| t.id.as_str()).collect()
}
