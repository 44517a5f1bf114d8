use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EmployeeId, PageCursor, TransactionId},
    error::ApiError,
    protocol::{Employee, PageQuery, PaginatedResult, SetTransactionApprovalRequest, Transaction},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{error::FetchError, DataSource};

#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("invalid server url '{url}': {source}")]
    Parse {
        url: String,
        source: url::ParseError,
    },
    #[error("server url '{0}' cannot be used as a base url")]
    CannotBeABase(String),
}

/// `DataSource` backed by the ledger server's JSON API.
pub struct HttpDataSource {
    http: Client,
    base_url: Url,
}

impl HttpDataSource {
    pub fn new(server_url: &str) -> Result<Self, BaseUrlError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, BaseUrlError> {
        let base_url = Url::parse(server_url.trim()).map_err(|source| BaseUrlError::Parse {
            url: server_url.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BaseUrlError::CannotBeABase(server_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiError>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.as_u16().to_string());
    debug!(status = status.as_u16(), %message, "server rejected request");

    if status == StatusCode::NOT_FOUND {
        Err(FetchError::NotFound(message))
    } else {
        Err(FetchError::Server(message))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn employees(&self) -> Result<Vec<Employee>, FetchError> {
        self.send_json(self.http.get(self.endpoint(&["employees"])))
            .await
    }

    async fn transactions_page(
        &self,
        cursor: PageCursor,
    ) -> Result<PaginatedResult<Transaction>, FetchError> {
        let request = self
            .http
            .get(self.endpoint(&["transactions"]))
            .query(&PageQuery {
                page: cursor.index(),
            });
        self.send_json(request).await
    }

    async fn transactions_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<Transaction>, FetchError> {
        let url = self.endpoint(&["employees", employee_id.as_str(), "transactions"]);
        self.send_json(self.http.get(url)).await
    }

    async fn set_transaction_approval(
        &self,
        transaction_id: &TransactionId,
        approved: bool,
    ) -> Result<(), FetchError> {
        let url = self.endpoint(&["transactions", transaction_id.as_str(), "approval"]);
        let response = self
            .http
            .post(url)
            .json(&SetTransactionApprovalRequest { value: approved })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
