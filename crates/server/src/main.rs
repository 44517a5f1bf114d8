use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    list_employees, list_transactions_for_employee, list_transactions_page,
    set_transaction_approval, ApiContext,
};
use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    error::{ApiError, ErrorCode},
    protocol::{Employee, PageQuery, PaginatedResult, SetTransactionApprovalRequest, Transaction},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_ledger, load_settings};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    latency: Duration,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let ledger = load_ledger(&settings)?;
    info!(
        employees = ledger.employees().len(),
        transactions = ledger.transactions().len(),
        per_page = settings.transactions_per_page,
        "ledger loaded"
    );

    let state = AppState {
        api: ApiContext::new(ledger, settings.transactions_per_page),
        latency: settings.simulated_latency(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/employees", get(http_list_employees))
        .route(
            "/employees/:employee_id/transactions",
            get(http_list_transactions_for_employee),
        )
        .route("/transactions", get(http_list_transactions_page))
        .route(
            "/transactions/:transaction_id/approval",
            post(http_set_transaction_approval),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_employees(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Employee>>> {
    simulate_latency(&state).await;
    list_employees(&state.api)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_list_transactions_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Transaction>>> {
    simulate_latency(&state).await;
    list_transactions_page(&state.api, PageCursor(q.page))
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_list_transactions_for_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<Vec<Transaction>>> {
    simulate_latency(&state).await;
    list_transactions_for_employee(&state.api, &EmployeeId::new(employee_id))
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_set_transaction_approval(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
    Json(req): Json<SetTransactionApprovalRequest>,
) -> ApiResult<StatusCode> {
    simulate_latency(&state).await;
    set_transaction_approval(&state.api, &TransactionId::new(transaction_id), req.value)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn simulate_latency(state: &AppState) {
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(status = status.as_u16(), message = %err.message, "request failed");
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
