//! Dashboard view coordinator.
//!
//! Owns the three resource stores and the selection state machine:
//! `Authoritative::All` shows the merged pages of all transactions,
//! `Authoritative::Employee(id)` shows one employee's transactions. Switching
//! selection invalidates the store that stops being authoritative before the
//! newly authoritative one is fetched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{EmployeeId, TransactionId},
    protocol::{Employee, Transaction},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    pagination::PaginatedTransactionsResource,
    resources::{EmployeesResource, TransactionsByEmployeeResource},
    store::FetchOutcome,
    DataSource,
};

const EVENT_CAPACITY: usize = 64;

/// Which transaction store currently backs the displayed list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Authoritative {
    #[default]
    All,
    Employee(EmployeeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SelectionChanged(Authoritative),
    ViewUpdated,
    Error(String),
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub transactions: Option<Vec<Transaction>>,
    pub employee_options: Vec<Employee>,
    pub selection: Authoritative,
    pub error: Option<String>,
    pub employees_loading: bool,
    pub paginated_loading: bool,
    pub by_employee_loading: bool,
    pub action_in_flight: bool,
    pub show_load_more: bool,
    pub load_more_disabled: bool,
}

#[derive(Default)]
struct CoordinatorContext {
    authoritative: Authoritative,
    error: Option<String>,
    actions_in_flight: usize,
}

struct ActionGuard<'a> {
    coordinator: &'a ViewCoordinator,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        let mut context = self.coordinator.context();
        context.actions_in_flight = context.actions_in_flight.saturating_sub(1);
    }
}

pub struct ViewCoordinator {
    source: Arc<dyn DataSource>,
    employees: EmployeesResource,
    paginated: PaginatedTransactionsResource,
    by_employee: TransactionsByEmployeeResource,
    context: Mutex<CoordinatorContext>,
    events: broadcast::Sender<DashboardEvent>,
}

impl ViewCoordinator {
    pub fn new(source: Arc<dyn DataSource>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            employees: EmployeesResource::new(source.clone()),
            paginated: PaginatedTransactionsResource::new(source.clone()),
            by_employee: TransactionsByEmployeeResource::new(source.clone()),
            source,
            context: Mutex::new(CoordinatorContext::default()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn employees(&self) -> &EmployeesResource {
        &self.employees
    }

    pub fn paginated_transactions(&self) -> &PaginatedTransactionsResource {
        &self.paginated
    }

    pub fn transactions_by_employee(&self) -> &TransactionsByEmployeeResource {
        &self.by_employee
    }

    /// Initial load: runs only while employees were never fetched and no
    /// employees request is outstanding.
    pub async fn on_page_load(&self) {
        let state = self.employees.state();
        if state.value.is_none() && !state.loading {
            self.load_all_transactions().await;
        }
    }

    /// `None` and the "All Employees" sentinel both clear the filter.
    pub async fn select_employee(&self, employee: Option<&Employee>) {
        match employee {
            Some(employee) if !employee.is_empty_sentinel() => {
                self.load_transactions_by_employee(employee.id.clone())
                    .await;
            }
            _ => {
                self.set_authoritative(Authoritative::All);
                self.load_all_transactions().await;
            }
        }
    }

    pub async fn load_more(&self) {
        if !self.all_employees_selected() {
            debug!("load more ignored while an employee filter is active");
            return;
        }
        if self.load_more_disabled() {
            debug!("load more ignored while transactions are loading");
            return;
        }

        let _action = self.begin_action();
        let result = self.paginated.fetch_next_page().await;
        self.settle(result);
        self.emit(DashboardEvent::ViewUpdated);
    }

    pub async fn set_transaction_approval(&self, transaction_id: &TransactionId, approved: bool) {
        let _action = self.begin_action();
        match self
            .source
            .set_transaction_approval(transaction_id, approved)
            .await
        {
            Ok(()) => {
                let id = transaction_id.clone();
                self.paginated
                    .store()
                    .amend(move |result| mark_approval(&mut result.data, &id, approved));
                let id = transaction_id.clone();
                self.by_employee
                    .store()
                    .amend(move |transactions| mark_approval(transactions, &id, approved));
                info!(%transaction_id, approved, "transaction approval updated");
            }
            Err(err) => self.record_error(&err),
        }
        self.emit(DashboardEvent::ViewUpdated);
    }

    pub fn authoritative(&self) -> Authoritative {
        self.context().authoritative.clone()
    }

    pub fn all_employees_selected(&self) -> bool {
        self.context().authoritative == Authoritative::All
    }

    /// The list to display, read from the authoritative store only.
    pub fn transactions(&self) -> Option<Vec<Transaction>> {
        match self.authoritative() {
            Authoritative::All => self
                .paginated
                .store()
                .with_value(|value| value.map(|result| result.data.clone())),
            Authoritative::Employee(_) => self.by_employee.store().value(),
        }
    }

    /// Filter entries: the "All Employees" sentinel followed by every
    /// fetched employee, or nothing while employees are unfetched.
    pub fn employee_options(&self) -> Vec<Employee> {
        self.employees.store().with_value(|value| match value {
            Some(employees) => std::iter::once(Employee::empty())
                .chain(employees.iter().cloned())
                .collect(),
            None => Vec::new(),
        })
    }

    pub fn show_load_more(&self) -> bool {
        self.all_employees_selected() && self.paginated.next_page().is_some()
    }

    pub fn load_more_disabled(&self) -> bool {
        self.paginated.store().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.context().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.context().error = None;
    }

    /// True while any coordinator action is running, independent of which
    /// stores it touched.
    pub fn action_in_flight(&self) -> bool {
        self.context().actions_in_flight > 0
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            transactions: self.transactions(),
            employee_options: self.employee_options(),
            selection: self.authoritative(),
            error: self.error(),
            employees_loading: self.employees.store().is_loading(),
            paginated_loading: self.paginated.store().is_loading(),
            by_employee_loading: self.by_employee.store().is_loading(),
            action_in_flight: self.action_in_flight(),
            show_load_more: self.show_load_more(),
            load_more_disabled: self.load_more_disabled(),
        }
    }

    async fn load_all_transactions(&self) {
        let _action = self.begin_action();
        self.by_employee.invalidate_data();

        let employees = async {
            if self.employees.store().is_loading() {
                debug!("employees request already outstanding");
                None
            } else {
                Some(self.employees.fetch_all().await)
            }
        };
        let (employees, transactions) = futures::join!(employees, self.paginated.fetch_all());

        if let Some(result) = employees {
            self.settle(result);
        }
        self.settle(transactions);
        self.emit(DashboardEvent::ViewUpdated);
    }

    async fn load_transactions_by_employee(&self, employee_id: EmployeeId) {
        let _action = self.begin_action();
        self.set_authoritative(Authoritative::Employee(employee_id.clone()));
        self.paginated.invalidate_data();

        let result = self.by_employee.fetch_by_id(&employee_id).await;
        self.settle(result);
        self.emit(DashboardEvent::ViewUpdated);
    }

    fn set_authoritative(&self, authoritative: Authoritative) {
        {
            let mut context = self.context();
            if context.authoritative == authoritative {
                return;
            }
            context.authoritative = authoritative.clone();
        }
        info!(selection = ?authoritative, "selection changed");
        self.emit(DashboardEvent::SelectionChanged(authoritative));
    }

    fn settle(&self, result: Result<FetchOutcome, FetchError>) {
        if let Err(err) = result {
            self.record_error(&err);
        }
    }

    fn record_error(&self, err: &FetchError) {
        let message = err.to_string();
        warn!(error = %message, "dashboard request failed");
        self.context().error = Some(message.clone());
        self.emit(DashboardEvent::Error(message));
    }

    fn begin_action(&self) -> ActionGuard<'_> {
        self.context().actions_in_flight += 1;
        ActionGuard { coordinator: self }
    }

    fn emit(&self, event: DashboardEvent) {
        let _ = self.events.send(event);
    }

    fn context(&self) -> MutexGuard<'_, CoordinatorContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mark_approval(
    transactions: &mut [Transaction],
    transaction_id: &TransactionId,
    approved: bool,
) {
    for transaction in transactions.iter_mut() {
        if &transaction.id == transaction_id {
            transaction.approved = approved;
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
