use super::*;
use axum::{body, body::Body, http::Request};
use server_api::{Ledger, TRANSACTIONS_PER_PAGE};
use tower::ServiceExt;

fn test_app() -> (Router, ApiContext) {
    let api = ApiContext::new(Ledger::sample().expect("ledger"), TRANSACTIONS_PER_PAGE);
    let app = build_router(Arc::new(AppState {
        api: api.clone(),
        latency: Duration::ZERO,
    }));
    (app, api)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _api) = test_app();
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn employees_and_first_page_routes_work() {
    let (app, _api) = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/employees").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let employees: Vec<Employee> = read_json(response).await;
    assert_eq!(employees.len(), 4);
    assert!(employees.iter().all(|e| !e.is_empty_sentinel()));

    let response = app
        .oneshot(
            Request::get("/transactions?page=0")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let page: PaginatedResult<Transaction> = read_json(response).await;
    assert_eq!(page.data.len(), TRANSACTIONS_PER_PAGE);
    assert_eq!(page.next_page, Some(PageCursor(1)));
}

#[tokio::test]
async fn out_of_range_page_is_bad_request() {
    let (app, _api) = test_app();
    let response = app
        .oneshot(
            Request::get("/transactions?page=99")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn unknown_employee_is_not_found() {
    let (app, _api) = test_app();
    let response = app
        .oneshot(
            Request::get("/employees/nobody/transactions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approval_route_updates_ledger() {
    let (app, api) = test_app();
    let target = api.ledger.read().await.transactions()[0].clone();

    let request = Request::post(format!("/transactions/{}/approval", target.id))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "value": !target.approved }).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        api.ledger.read().await.transactions()[0].approved,
        !target.approved
    );

    let request = Request::post("/transactions/missing/approval")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "value": true }).to_string()))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
