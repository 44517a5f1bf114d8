use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{EmployeeId, PageCursor, TransactionId};

pub const EMPTY_EMPLOYEE_ID: &str = "";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
}

impl Employee {
    /// The "All Employees" entry of the filter. The backend never returns it.
    pub fn empty() -> Self {
        Self {
            id: EmployeeId::new(EMPTY_EMPLOYEE_ID),
            first_name: "All".to_string(),
            last_name: "Employees".to_string(),
        }
    }

    pub fn is_empty_sentinel(&self) -> bool {
        self.id.as_str() == EMPTY_EMPLOYEE_ID
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: f64,
    pub employee: Employee,
    pub merchant: String,
    pub date: NaiveDate,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub next_page: Option<PageCursor>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetTransactionApprovalRequest {
    pub value: bool,
}

/// JSON fixture layout the ledger backend is seeded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFixture {
    pub employees: Vec<Employee>,
    pub transactions: Vec<Transaction>,
}
