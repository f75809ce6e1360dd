//! Windowed, incrementally loaded rows of one listing query.
//!
//! The window performs no I/O. `begin_*` records the intent and hands back a
//! [`FetchTicket`] describing the request to make; the caller performs it and
//! feeds the result to [`ListWindow::apply`] or [`ListWindow::fail`]. Each ticket
//! carries the generation it was issued under, and every reset starts a new
//! generation, so a late response for a superseded query is dropped instead of
//! being merged into the new one.

use tracing::debug;

use super::query::{Page, PageRequest};

/// What a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of a new query; replaces all rows.
    Reset,
    /// Next page of the current query; appended, then shown as `page`.
    More { page: usize },
}

/// An outstanding fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket<Q> {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: PageRequest<Q>,
}

/// Result of asking for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageStep<Q> {
    /// Rows already present; the page changed without a fetch.
    Local,
    /// Rows must be fetched with this ticket.
    Fetch(FetchTicket<Q>),
    /// Beyond the loaded rows and the service has nothing more.
    NoMore,
}

/// What applying a fetch result did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A follow-up page came back empty; no further pages are requested.
    LastPageReached,
    /// The ticket belongs to a superseded query; nothing changed.
    Stale,
}

/// Rows to display for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowsView<T> {
    /// The first fetch of the current query has not completed.
    Loading,
    /// The first fetch completed with no rows.
    Empty,
    Page(Vec<T>),
}

impl<T> RowsView<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            RowsView::Page(rows) => rows,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListWindow<Q, R> {
    query: Q,
    page_size: usize,
    rows: Vec<R>,
    next_token: Option<String>,
    total_count: Option<u64>,
    current_page: usize,
    highest_page: usize,
    generation: u64,
    loaded: bool,
    loading: bool,
}

impl<Q: Clone, R> ListWindow<Q, R> {
    /// An empty window; nothing is fetched until [`ListWindow::begin_reset`].
    pub fn new(query: Q, page_size: usize) -> Self {
        Self {
            query,
            page_size: page_size.max(1),
            rows: Vec::new(),
            next_token: None,
            total_count: None,
            current_page: 0,
            highest_page: 0,
            generation: 0,
            loaded: false,
            loading: false,
        }
    }

    /// Switch to `query`, discarding all rows, and return the first-page ticket.
    pub fn begin_reset(&mut self, query: Q) -> FetchTicket<Q> {
        self.generation += 1;
        self.query = query;
        self.rows.clear();
        self.next_token = None;
        self.total_count = None;
        self.current_page = 0;
        self.highest_page = 0;
        self.loaded = false;
        self.loading = true;

        FetchTicket {
            generation: self.generation,
            kind: FetchKind::Reset,
            request: PageRequest {
                query: self.query.clone(),
                max_items: self.page_size,
                next_token: None,
            },
        }
    }

    /// Move to `page`, locally when its rows are present.
    pub fn begin_page(&mut self, page: usize) -> PageStep<Q> {
        if page <= self.highest_page {
            self.current_page = page;
            return PageStep::Local;
        }
        let Some(token) = self.next_token.clone() else {
            debug!(page, "No continuation token; nothing more to fetch");
            return PageStep::NoMore;
        };
        self.loading = true;
        PageStep::Fetch(FetchTicket {
            generation: self.generation,
            kind: FetchKind::More { page },
            request: PageRequest {
                query: self.query.clone(),
                max_items: self.page_size,
                next_token: Some(token),
            },
        })
    }

    pub fn apply(&mut self, ticket: &FetchTicket<Q>, page: Page<R>) -> Applied {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding result of a superseded query"
            );
            return Applied::Stale;
        }
        self.loading = false;

        match ticket.kind {
            FetchKind::Reset => {
                self.rows = page.rows;
                self.next_token = page.next_token;
                self.total_count = page.total_count;
                self.loaded = true;
                Applied::Applied
            }
            FetchKind::More { .. } if page.rows.is_empty() => {
                self.next_token = None;
                Applied::LastPageReached
            }
            FetchKind::More { page: target } => {
                self.rows.extend(page.rows);
                self.next_token = page.next_token;
                self.total_count = page.total_count;
                self.current_page = target;
                self.highest_page = target;
                Applied::Applied
            }
        }
    }

    /// Record a failed fetch. Rows and paging are left as they were.
    pub fn fail(&mut self, ticket: &FetchTicket<Q>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.loading = false;
        true
    }

    /// Rows of `page`, minus those rejected by `filter`.
    pub fn visible_rows(&self, page: usize, filter: Option<&dyn Fn(&R) -> bool>) -> RowsView<&R> {
        if !self.loaded {
            return RowsView::Loading;
        }
        if self.rows.is_empty() {
            return RowsView::Empty;
        }
        let (start, end) = self.page_bounds(page);
        let start = start.min(self.rows.len());
        let end = end.min(self.rows.len());
        RowsView::Page(
            self.rows[start..end]
                .iter()
                .filter(|row| filter.is_none_or(|f| f(*row)))
                .collect(),
        )
    }

    pub fn current_rows(&self, filter: Option<&dyn Fn(&R) -> bool>) -> RowsView<&R> {
        self.visible_rows(self.current_page, filter)
    }

    /// On the last loaded page with nothing more upstream; "next" is disabled.
    pub fn on_last_page(&self) -> bool {
        self.current_page == self.highest_page && self.next_token.is_none()
    }

    /// Pagination label such as `"26–50 of 120"`. Without a total, the loaded
    /// row count is shown, suffixed with `+` while more pages exist.
    pub fn range_label(&self) -> String {
        let loaded = self.rows.len();
        let (start, end) = self.page_bounds(self.current_page);
        let from = if loaded == 0 {
            0
        } else {
            start.saturating_add(1)
        };
        match self.total_count {
            Some(count) => {
                let to = end.min(usize::try_from(count).unwrap_or(usize::MAX));
                format!("{from}–{to} of {count}")
            }
            None if self.on_last_page() => format!("{from}–{loaded} of {loaded}"),
            None => {
                let to = end;
                let more = if self.next_token.is_some() { "+" } else { "" };
                format!("{from}–{to} of {loaded}{more}")
            }
        }
    }

    /// Row offsets `[start, end)` of `page`, saturating for huge indices.
    fn page_bounds(&self, page: usize) -> (usize, usize) {
        let start = page.saturating_mul(self.page_size);
        (start, start.saturating_add(self.page_size))
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn highest_page(&self) -> usize {
        self.highest_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
