//! Async driver that pairs a [`ListWindow`] with a [`PageSource`].

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::query::{Column, Sortable};
use super::source::PageSource;
use super::window::{Applied, FetchTicket, ListWindow, PageStep, RowsView};
use crate::error::ApiError;

/// Client-side row predicate applied when rows are read.
pub type RowFilter<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// What a navigation call ended up doing.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A fetch completed and its rows were applied.
    Applied,
    /// The page was already loaded.
    Local,
    /// Past the end with no continuation token; nothing was requested.
    NoMore,
    LastPageReached,
    /// A newer query superseded this fetch before it completed.
    Stale,
    Failed(ApiError),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// A paginated list whose rows are fetched on demand.
///
/// The window lock is only taken around state transitions and is released
/// before the source is awaited.
pub struct PagedList<S: PageSource> {
    source: S,
    window: RwLock<ListWindow<S::Query, S::Row>>,
    filter: Option<RowFilter<S::Row>>,
}

impl<S: PageSource> PagedList<S> {
    /// Create an empty list. Nothing is fetched until [`PagedList::reset_and_fetch`].
    pub fn new(source: S, query: S::Query, page_size: usize) -> Self {
        Self {
            source,
            window: RwLock::new(ListWindow::new(query, page_size)),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Fn(&S::Row) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Discard all rows and load the first page of `query`.
    pub async fn reset_and_fetch(&self, query: S::Query) -> FetchOutcome {
        let ticket = self.window.write().await.begin_reset(query);
        self.run(ticket).await
    }

    /// Re-run the active query from the first page.
    pub async fn refresh(&self) -> FetchOutcome {
        let query = self.window.read().await.query().clone();
        self.reset_and_fetch(query).await
    }

    pub async fn go_to_page(&self, page: usize) -> FetchOutcome {
        let step = self.window.write().await.begin_page(page);
        match step {
            PageStep::Local => FetchOutcome::Local,
            PageStep::NoMore => FetchOutcome::NoMore,
            PageStep::Fetch(ticket) => self.run(ticket).await,
        }
    }

    async fn run(&self, ticket: FetchTicket<S::Query>) -> FetchOutcome {
        debug!(
            generation = ticket.generation,
            kind = ?ticket.kind,
            continued = ticket.request.next_token.is_some(),
            "Fetching page"
        );

        let result = self.source.fetch_page(ticket.request.clone()).await;

        let mut window = self.window.write().await;
        match result {
            Ok(page) => {
                let rows = page.rows.len();
                match window.apply(&ticket, page) {
                    Applied::Applied => {
                        debug!(rows, total = ?window.total_count(), "Page applied");
                        FetchOutcome::Applied
                    }
                    Applied::LastPageReached => {
                        info!("Last page reached");
                        FetchOutcome::LastPageReached
                    }
                    Applied::Stale => FetchOutcome::Stale,
                }
            }
            Err(e) => {
                if window.fail(&ticket) {
                    warn!(error = %e, "Failed to fetch page");
                    FetchOutcome::Failed(e)
                } else {
                    debug!(error = %e, "Superseded fetch failed");
                    FetchOutcome::Stale
                }
            }
        }
    }

    /// Rows of the current page after the row filter.
    pub async fn visible_rows(&self) -> RowsView<S::Row> {
        let window = self.window.read().await;
        let filter = self.filter.as_deref().map(|f| f as &dyn Fn(&S::Row) -> bool);
        match window.current_rows(filter) {
            RowsView::Loading => RowsView::Loading,
            RowsView::Empty => RowsView::Empty,
            RowsView::Page(rows) => RowsView::Page(rows.into_iter().cloned().collect()),
        }
    }

    pub async fn range_label(&self) -> String {
        self.window.read().await.range_label()
    }

    pub async fn on_last_page(&self) -> bool {
        self.window.read().await.on_last_page()
    }

    pub async fn current_page(&self) -> usize {
        self.window.read().await.current_page()
    }

    pub async fn total_count(&self) -> Option<u64> {
        self.window.read().await.total_count()
    }

    pub async fn query(&self) -> S::Query {
        self.window.read().await.query().clone()
    }

    pub async fn row_count(&self) -> usize {
        self.window.read().await.rows().len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S> PagedList<S>
where
    S: PageSource,
    S::Query: Sortable,
{
    /// Apply a header click and reload when the sort changed.
    pub async fn click_column(&self, column: &Column) -> Option<FetchOutcome> {
        let mut query = self.query().await;
        if !column.click(query.sort_by_mut()) {
            return None;
        }
        debug!(column = %column.name, "Sort changed");
        Some(self.reset_and_fetch(query).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::listing::query::{Page, PageRequest};
    use crate::models::{ListJobsQuery, SortDirection, SortField};

    /// Serves `rows` in pages, using the row offset as the continuation token.
    struct VecSource {
        rows: Vec<&'static str>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl VecSource {
        fn new(rows: &[&'static str]) -> Self {
            Self {
                rows: rows.to_vec(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl PageSource for VecSource {
        type Query = ();
        type Row = &'static str;

        async fn fetch_page(&self, request: PageRequest<()>) -> Result<Page<&'static str>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::RequestFailed {
                    endpoint: "test".into(),
                    reason: "down".into(),
                });
            }
            let start: usize = request.next_token.map_or(0, |t| t.parse().unwrap());
            let end = (start + request.max_items).min(self.rows.len());
            Ok(Page {
                rows: self.rows[start..end].to_vec(),
                next_token: (end < self.rows.len()).then(|| end.to_string()),
                total_count: Some(self.rows.len() as u64),
            })
        }
    }

    #[tokio::test]
    async fn pages_through_five_rows() {
        let list = PagedList::new(VecSource::new(&["A", "B", "C", "D", "E"]), (), 3);
        assert_eq!(list.visible_rows().await, RowsView::Loading);

        assert!(matches!(list.reset_and_fetch(()).await, FetchOutcome::Applied));
        assert_eq!(list.visible_rows().await.rows(), ["A", "B", "C"]);
        assert_eq!(list.range_label().await, "1–3 of 5");

        assert!(matches!(list.go_to_page(1).await, FetchOutcome::Applied));
        assert_eq!(list.visible_rows().await.rows(), ["D", "E"]);
        assert!(list.on_last_page().await);
        assert_eq!(list.row_count().await, 5);
        assert_eq!(list.range_label().await, "4–5 of 5");

        assert!(matches!(list.go_to_page(2).await, FetchOutcome::NoMore));
        assert_eq!(list.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn going_back_does_not_fetch() {
        let list = PagedList::new(VecSource::new(&["A", "B", "C", "D"]), (), 2);
        list.reset_and_fetch(()).await;
        list.go_to_page(1).await;
        assert_eq!(list.source().calls.load(Ordering::SeqCst), 2);

        assert!(matches!(list.go_to_page(0).await, FetchOutcome::Local));
        assert!(matches!(list.go_to_page(1).await, FetchOutcome::Local));
        assert_eq!(list.source().calls.load(Ordering::SeqCst), 2);
        assert_eq!(list.visible_rows().await.rows(), ["C", "D"]);
    }

    #[tokio::test]
    async fn failure_preserves_state() {
        let list = PagedList::new(
            VecSource {
                fail: true,
                ..VecSource::new(&["A"])
            },
            (),
            2,
        );
        let outcome = list.reset_and_fetch(()).await;
        assert!(outcome.is_failed());
        assert_eq!(list.visible_rows().await, RowsView::Loading);
    }

    #[tokio::test]
    async fn filter_applies_to_visible_rows() {
        let list = PagedList::new(VecSource::new(&["keep", "drop", "keep too"]), (), 3)
            .with_filter(|row| row.starts_with("keep"));
        list.reset_and_fetch(()).await;
        assert_eq!(list.visible_rows().await.rows(), ["keep", "keep too"]);
    }

    #[tokio::test]
    async fn empty_result_is_not_loading() {
        let list = PagedList::new(VecSource::new(&[]), (), 3);
        list.reset_and_fetch(()).await;
        assert_eq!(list.visible_rows().await, RowsView::Empty);
        assert_eq!(list.range_label().await, "0–0 of 0");
    }

    /// Responds slowly to ascending sorts so a later descending reset wins.
    struct SlowAscending;

    #[async_trait]
    impl PageSource for SlowAscending {
        type Query = ListJobsQuery;
        type Row = String;

        async fn fetch_page(&self, request: PageRequest<ListJobsQuery>) -> Result<Page<String>, ApiError> {
            let direction = request.query.sort_by[0].direction;
            if direction == SortDirection::Asc {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(Page {
                rows: vec![direction.as_str().to_string()],
                next_token: None,
                total_count: Some(1),
            })
        }
    }

    #[tokio::test]
    async fn superseded_fetch_is_discarded() {
        let asc = ListJobsQuery {
            sort_by: vec![SortField::new("name", SortDirection::Asc)],
            ..Default::default()
        };
        let desc = ListJobsQuery {
            sort_by: vec![SortField::new("name", SortDirection::Desc)],
            ..Default::default()
        };
        let list = PagedList::new(SlowAscending, asc.clone(), 25);

        let (first, second) = tokio::join!(list.reset_and_fetch(asc), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            list.reset_and_fetch(desc.clone()).await
        });

        assert!(matches!(first, FetchOutcome::Stale));
        assert!(matches!(second, FetchOutcome::Applied));
        assert_eq!(list.visible_rows().await.rows(), ["desc"]);
        assert_eq!(list.query().await, desc);
    }

    #[tokio::test]
    async fn column_click_resorts() {
        let list = PagedList::new(SlowAscending, ListJobsQuery::default(), 25);
        let name = Column::sortable("Job name", "name");

        assert!(matches!(list.click_column(&name).await, Some(FetchOutcome::Applied)));
        assert_eq!(
            list.query().await.sort_by,
            vec![SortField::new("name", SortDirection::Asc)]
        );
        assert!(list.click_column(&Column::plain("Actions")).await.is_none());
    }
}
