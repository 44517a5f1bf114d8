use std::sync::Arc;

use shared::{
    domain::PageCursor,
    protocol::{PaginatedResult, Transaction},
};

use crate::{
    error::FetchError,
    store::{replace, FetchOutcome, ResourceState, ResourceStore},
    DataSource,
};

/// Appends `page` to `merged` in arrival order and adopts its cursor.
///
/// Items are neither sorted nor deduplicated; a backend that repeats an id
/// across pages gets it rendered twice.
pub fn merge_page<T>(merged: &mut PaginatedResult<T>, page: PaginatedResult<T>) {
    merged.data.extend(page.data);
    merged.next_page = page.next_page;
}

pub struct PaginatedTransactionsResource {
    source: Arc<dyn DataSource>,
    store: ResourceStore<PaginatedResult<Transaction>>,
}

impl PaginatedTransactionsResource {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            store: ResourceStore::new("paginated_transactions"),
        }
    }

    pub fn store(&self) -> &ResourceStore<PaginatedResult<Transaction>> {
        &self.store
    }

    pub fn state(&self) -> ResourceState<PaginatedResult<Transaction>> {
        self.store.snapshot()
    }

    pub fn next_page(&self) -> Option<PageCursor> {
        self.store
            .with_value(|value| value.and_then(|result| result.next_page))
    }

    /// Loads the first page, discarding any pages merged so far.
    pub async fn fetch_all(&self) -> Result<FetchOutcome, FetchError> {
        self.store
            .fetch_with(self.source.transactions_page(PageCursor::FIRST), replace)
            .await
    }

    pub async fn fetch_next_page(&self) -> Result<FetchOutcome, FetchError> {
        let (in_flight, cursor) = self.store.begin_with(|value| match value {
            None => Err(FetchError::InvalidState(
                "no page has been loaded yet".to_string(),
            )),
            Some(PaginatedResult {
                next_page: None, ..
            }) => Err(FetchError::InvalidState(
                "there are no more pages".to_string(),
            )),
            Some(PaginatedResult {
                next_page: Some(cursor),
                ..
            }) => Ok(*cursor),
        })?;

        let result = self.source.transactions_page(cursor).await;
        self.store.complete(in_flight, result, |slot, page| match slot {
            Some(merged) => merge_page(merged, page),
            None => *slot = Some(page),
        })
    }

    pub fn invalidate_data(&self) {
        self.store.invalidate_data();
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
