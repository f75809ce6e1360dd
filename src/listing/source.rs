//! The fetch contract behind a paginated list.

use async_trait::async_trait;

use super::query::{Page, PageRequest};
use crate::error::ApiError;

/// Asynchronous page fetcher.
///
/// Must return an empty page (not an error) for queries with no results, and
/// an error for transport or decoding failures.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Query: Clone + Send + Sync + 'static;
    type Row: Clone + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        request: PageRequest<Self::Query>,
    ) -> Result<Page<Self::Row>, ApiError>;
}
