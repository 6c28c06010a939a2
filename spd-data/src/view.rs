//! What a table shows for a given state, in client or server pagination
//! mode.
//!
//! In client mode the table owns the whole collection and runs the
//! [`crate::list`] pipeline itself. In server mode the rows are already one
//! processed page and the totals come from whoever fetched them.

use crate::list::{clamp_page, process, total_pages};
use crate::record::Record;
use crate::sort::SortState;

/// Totals reported alongside a server-processed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerTotals {
    pub total_items: usize,
    pub total_pages: Option<usize>,
    pub has_next_page: Option<bool>,
    pub has_prev_page: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationMode {
    Client,
    Server(ServerTotals),
}

/// State a table keeps for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    pub sort: SortState,
    /// 1-based.
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort: SortState::unsorted(),
            page: 1,
        }
    }
}

/// Values pinned by a parent. `None` leaves the field to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controlled {
    pub page: Option<usize>,
    pub sort: Option<SortState>,
}

/// A controlled value, when supplied, wins over internal state.
pub fn resolve<T: Clone>(controlled: Option<&T>, internal: &T) -> T {
    controlled.unwrap_or(internal).clone()
}

/// The state a table renders with after applying [`resolve`] per field.
pub fn effective_state(internal: &ViewState, controlled: &Controlled) -> ViewState {
    ViewState {
        search_term: internal.search_term.clone(),
        sort: resolve(controlled.sort.as_ref(), &internal.sort),
        page: resolve(controlled.page.as_ref(), &internal.page),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView<T> {
    pub rows: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub sort: SortState,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

pub fn compute_view<T: Record + Clone, S: AsRef<str>>(
    items: &[T],
    mode: &PaginationMode,
    state: &ViewState,
    search_fields: &[S],
    page_size: usize,
) -> TableView<T> {
    match mode {
        PaginationMode::Client => {
            let run = |page| process(items, &state.search_term, search_fields, &state.sort, page, page_size);
            let mut listed = run(state.page);
            let pages = listed.total_pages;
            let page = clamp_page(state.page, pages);
            if page != state.page {
                listed = run(page);
            }
            TableView {
                rows: listed.items,
                current_page: page,
                total_pages: pages,
                total_items: listed.total_matching,
                sort: state.sort.clone(),
                has_next_page: page < pages,
                has_prev_page: page > 1,
            }
        }
        PaginationMode::Server(totals) => {
            let pages = totals
                .total_pages
                .unwrap_or_else(|| total_pages(totals.total_items, page_size))
                .max(1);
            TableView {
                rows: items.to_vec(),
                current_page: clamp_page(state.page, pages),
                total_pages: pages,
                total_items: totals.total_items,
                sort: state.sort.clone(),
                has_next_page: totals.has_next_page.unwrap_or(false),
                has_prev_page: totals.has_prev_page.unwrap_or(false),
            }
        }
    }
}
