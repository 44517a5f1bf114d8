use std::fmt::Write;

use client_core::{Authoritative, DashboardView};
use shared::protocol::{Employee, Transaction};

pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Filter: {}", selection_label(view));
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if view.employees_loading || view.paginated_loading || view.by_employee_loading {
        let _ = writeln!(out, "Loading...");
    }

    match &view.transactions {
        None => {
            let _ = writeln!(out, "No transactions loaded.");
        }
        Some(transactions) if transactions.is_empty() => {
            let _ = writeln!(out, "No transactions.");
        }
        Some(transactions) => {
            for transaction in transactions {
                let _ = writeln!(out, "{}", transaction_row(transaction));
            }
        }
    }

    if view.show_load_more {
        let label = if view.load_more_disabled {
            "[loading more]"
        } else {
            "[more available]"
        };
        let _ = writeln!(out, "{label}");
    }
    out
}

pub fn render_employees(options: &[Employee]) -> String {
    let mut out = String::new();
    for employee in options {
        if employee.is_empty_sentinel() {
            let _ = writeln!(out, "{:<10} {}", "*", employee.display_name());
        } else {
            let _ = writeln!(out, "{:<10} {}", employee.id, employee.display_name());
        }
    }
    out
}

fn selection_label(view: &DashboardView) -> String {
    match &view.selection {
        Authoritative::All => Employee::empty().display_name(),
        Authoritative::Employee(id) => view
            .employee_options
            .iter()
            .find(|employee| &employee.id == id)
            .map(|employee| format!("{} ({id})", employee.display_name()))
            .unwrap_or_else(|| id.to_string()),
    }
}

fn transaction_row(transaction: &Transaction) -> String {
    let mark = if transaction.approved { "[x]" } else { "[ ]" };
    format!(
        "{mark} {:<8} {} {:<20} {:<24} {:>10.2}",
        transaction.id,
        transaction.date,
        transaction.employee.display_name(),
        transaction.merchant,
        transaction.amount,
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
