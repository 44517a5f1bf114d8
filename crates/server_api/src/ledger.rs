use std::collections::HashSet;

use shared::{
    domain::{EmployeeId, TransactionId},
    protocol::{Employee, LedgerFixture, Transaction},
};
use thiserror::Error;

const SAMPLE_FIXTURE: &str = include_str!("../data/mock_data.json");

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to parse ledger fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("employee ids must not be empty")]
    EmptyEmployeeId,
    #[error("duplicate employee id {0}")]
    DuplicateEmployee(EmployeeId),
    #[error("duplicate transaction id {0}")]
    DuplicateTransaction(TransactionId),
}

/// In-memory employees and transactions, in fixture order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    employees: Vec<Employee>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn from_fixture(fixture: LedgerFixture) -> Result<Self, LedgerError> {
        let mut employee_ids = HashSet::new();
        for employee in &fixture.employees {
            if employee.is_empty_sentinel() {
                return Err(LedgerError::EmptyEmployeeId);
            }
            if !employee_ids.insert(employee.id.clone()) {
                return Err(LedgerError::DuplicateEmployee(employee.id.clone()));
            }
        }

        let mut transaction_ids = HashSet::new();
        for transaction in &fixture.transactions {
            if !transaction_ids.insert(transaction.id.clone()) {
                return Err(LedgerError::DuplicateTransaction(transaction.id.clone()));
            }
        }

        Ok(Self {
            employees: fixture.employees,
            transactions: fixture.transactions,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, LedgerError> {
        let fixture: LedgerFixture = serde_json::from_str(raw)?;
        Self::from_fixture(fixture)
    }

    /// The bundled demo ledger: four employees and 22 transactions.
    pub fn sample() -> Result<Self, LedgerError> {
        Self::from_json(SAMPLE_FIXTURE)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn employee(&self, employee_id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| &e.id == employee_id)
    }

    pub fn transaction_mut(&mut self, transaction_id: &TransactionId) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|t| &t.id == transaction_id)
    }
}
