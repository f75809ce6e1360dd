//! Listing queries, pages and the column sort protocol.

use serde::{Deserialize, Serialize};

use crate::models::{ListJobDefinitionsQuery, ListJobsQuery, SortDirection, SortField};

/// A request for one page: the caller's query plus paging parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest<Q> {
    pub query: Q,
    pub max_items: usize,
    /// `None` asks for the first page.
    pub next_token: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub rows: Vec<R>,
    /// Absent when the service has no further pages.
    pub next_token: Option<String>,
    /// Total rows matching the query, independent of how many were returned.
    pub total_count: Option<u64>,
}

impl<R> Page<R> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            next_token: None,
            total_count: Some(0),
        }
    }
}

/// Queries carrying a `sort_by` list.
pub trait Sortable {
    fn sort_by(&self) -> &[SortField];
    fn sort_by_mut(&mut self) -> &mut Vec<SortField>;
}

impl Sortable for ListJobsQuery {
    fn sort_by(&self) -> &[SortField] {
        &self.sort_by
    }
    fn sort_by_mut(&mut self) -> &mut Vec<SortField> {
        &mut self.sort_by
    }
}

impl Sortable for ListJobDefinitionsQuery {
    fn sort_by(&self) -> &[SortField] {
        &self.sort_by
    }
    fn sort_by_mut(&mut self) -> &mut Vec<SortField> {
        &mut self.sort_by
    }
}

/// A table column. Columns without a sort field ignore header clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sort_field: Option<String>,
}

impl Column {
    pub fn sortable(name: impl Into<String>, sort_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_field: Some(sort_field.into()),
        }
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_field: None,
        }
    }

    /// Direction shown on the header, if this column is the active sort.
    pub fn sort_indicator(&self, sort: &[SortField]) -> Option<SortDirection> {
        let field = self.sort_field.as_deref()?;
        sort.first().filter(|s| s.name == field).map(|s| s.direction)
    }

    /// Apply a header click to `sort`. Returns whether the sort changed.
    pub fn click(&self, sort: &mut Vec<SortField>) -> bool {
        match self.sort_field.as_deref() {
            Some(field) => {
                toggle_sort(sort, field);
                true
            }
            None => false,
        }
    }
}

/// Make `field` the active sort: ascending unless it is already active and
/// ascending. Other entries for the same field are dropped.
pub fn toggle_sort(sort: &mut Vec<SortField>, field: &str) {
    let direction = match sort.first() {
        Some(active) if active.name == field && active.direction == SortDirection::Asc => {
            SortDirection::Desc
        }
        _ => SortDirection::Asc,
    };
    sort.retain(|s| s.name != field);
    sort.insert(0, SortField::new(field, direction));
}

/// Columns of the jobs table.
pub fn job_columns() -> Vec<Column> {
    vec![
        Column::sortable("Job name", "name"),
        Column::plain("Input file"),
        Column::plain("Output files"),
        Column::sortable("Created at", "create_time"),
        Column::sortable("Status", "status"),
        Column::plain("Actions"),
    ]
}

/// Columns of the job definitions table.
pub fn job_definition_columns() -> Vec<Column> {
    vec![
        Column::sortable("Name", "name"),
        Column::plain("Input file"),
        Column::sortable("Created at", "create_time"),
        Column::plain("Schedule"),
        Column::plain("Status"),
        Column::plain("Actions"),
    ]
}
