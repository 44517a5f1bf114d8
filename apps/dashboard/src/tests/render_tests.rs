use super::*;
use chrono::NaiveDate;
use shared::domain::{EmployeeId, TransactionId};

fn jane() -> Employee {
    Employee {
        id: EmployeeId::from("emp-1"),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
    }
}

fn transaction(id: &str, approved: bool) -> Transaction {
    Transaction {
        id: TransactionId::from(id),
        amount: 1234.5,
        employee: jane(),
        merchant: "Office Depot".into(),
        date: NaiveDate::from_ymd_opt(2022, 3, 14).expect("date"),
        approved,
    }
}

fn view() -> DashboardView {
    DashboardView {
        transactions: None,
        employee_options: Vec::new(),
        selection: Authoritative::All,
        error: None,
        employees_loading: false,
        paginated_loading: false,
        by_employee_loading: false,
        action_in_flight: false,
        show_load_more: false,
        load_more_disabled: false,
    }
}

#[test]
fn unloaded_view_says_so() {
    let rendered = render_view(&view());
    assert!(rendered.starts_with("Filter: All Employees\n"));
    assert!(rendered.contains("No transactions loaded."));
    assert!(!rendered.contains("more"));
}

#[test]
fn rows_show_approval_mark_and_amount() {
    let rendered = render_view(&DashboardView {
        transactions: Some(vec![transaction("tx1", true), transaction("tx2", false)]),
        show_load_more: true,
        ..view()
    });

    let rows: Vec<&str> = rendered.lines().filter(|l| l.starts_with('[')).collect();
    assert!(rows[0].starts_with("[x] tx1"));
    assert!(rows[0].contains("2022-03-14"));
    assert!(rows[0].contains("Jane Doe"));
    assert!(rows[0].ends_with("1234.50"));
    assert!(rows[1].starts_with("[ ] tx2"));
    assert_eq!(rendered.lines().last(), Some("[more available]"));
}

#[test]
fn pending_next_page_shows_disabled_control() {
    let rendered = render_view(&DashboardView {
        transactions: Some(vec![transaction("tx1", false)]),
        show_load_more: true,
        load_more_disabled: true,
        paginated_loading: true,
        ..view()
    });
    assert!(rendered.contains("Loading..."));
    assert_eq!(rendered.lines().last(), Some("[loading more]"));
}

#[test]
fn filtered_view_names_the_employee_and_keeps_error_banner() {
    let rendered = render_view(&DashboardView {
        transactions: Some(Vec::new()),
        employee_options: vec![Employee::empty(), jane()],
        selection: Authoritative::Employee(EmployeeId::from("emp-1")),
        error: Some("500".into()),
        ..view()
    });
    assert!(rendered.starts_with("Filter: Jane Doe (emp-1)\nError: 500\n"));
    assert!(rendered.contains("No transactions."));
}

#[test]
fn unknown_selected_employee_falls_back_to_id() {
    let rendered = render_view(&DashboardView {
        selection: Authoritative::Employee(EmployeeId::from("emp-9")),
        ..view()
    });
    assert!(rendered.starts_with("Filter: emp-9\n"));
}

#[test]
fn employee_listing_marks_the_sentinel() {
    let rendered = render_employees(&[Employee::empty(), jane()]);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], format!("{:<10} All Employees", "*"));
    assert_eq!(lines[1], format!("{:<10} Jane Doe", "emp-1"));
}
