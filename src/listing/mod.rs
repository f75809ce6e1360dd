//! Paginated listings: query and sort types, the page window, the async list
//! driver and the jobs listing model.

pub mod jobs_model;
pub mod list;
pub mod query;
pub mod source;
pub mod window;

pub use jobs_model::{JobsListingModel, ListingEvent, spawn_poll_task};
pub use list::{FetchOutcome, PagedList, RowFilter};
pub use query::{Column, Page, PageRequest, Sortable, job_columns, job_definition_columns, toggle_sort};
pub use source::PageSource;
pub use window::{Applied, FetchKind, FetchTicket, ListWindow, PageStep, RowsView};
