//! The interactive table: search box, sortable headers, page controls.
//!
//! Rendering reads [`DataTable::view`]; input goes through `search`,
//! `change_page` and `click_column`. Every piece of state can be owned by
//! the table or pinned by a parent through [`Controlled`]. Pinned values
//! win, and changes to them go out through the handlers instead of being
//! applied locally.

use crate::timer::Debouncer;
use spd_data::record::Record;
use spd_data::sort::{click, Column, SortState};
use spd_data::view::{compute_view, effective_state, Controlled, PaginationMode, ServerTotals, TableView, ViewState};
use std::rc::Rc;
use std::time::Duration;

pub type Callback<A> = Rc<dyn Fn(A)>;

#[derive(Clone, Default)]
pub struct TableHandlers {
    /// Receives the search term once typing pauses.
    pub on_search_change: Option<Callback<String>>,
    pub on_page_change: Option<Callback<usize>>,
    pub on_sort_change: Option<Callback<SortState>>,
}

pub struct DataTable<T> {
    columns: Vec<Column>,
    search_fields: Vec<String>,
    page_size: usize,
    mode: PaginationMode,
    items: Vec<T>,
    internal: ViewState,
    controlled: Controlled,
    handlers: TableHandlers,
    search_timer: Debouncer,
}

impl<T: Record + Clone> DataTable<T> {
    /// A client-side table.
    pub fn new(columns: Vec<Column>, search_fields: &[&str], page_size: usize, search_debounce: Duration) -> Self {
        Self {
            columns,
            search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
            page_size: page_size.max(1),
            mode: PaginationMode::Client,
            items: Vec::new(),
            internal: ViewState::default(),
            controlled: Controlled::default(),
            handlers: TableHandlers::default(),
            search_timer: Debouncer::new(search_debounce),
        }
    }

    /// Switch to server-side pagination: rows are shown as given.
    pub fn server_side(mut self, totals: ServerTotals) -> Self {
        self.mode = PaginationMode::Server(totals);
        self
    }

    pub fn with_handlers(mut self, handlers: TableHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// New totals for a server-side table; ignored in client mode.
    pub fn set_server_totals(&mut self, totals: ServerTotals) {
        if let PaginationMode::Server(current) = &mut self.mode {
            *current = totals;
        }
    }

    pub fn set_controlled(&mut self, controlled: Controlled) {
        self.controlled = controlled;
    }

    /// What the search box shows, updated on every keystroke.
    pub fn search_term(&self) -> &str {
        &self.internal.search_term
    }

    pub fn view(&self) -> TableView<T> {
        let state = effective_state(&self.internal, &self.controlled);
        compute_view(&self.items, &self.mode, &state, &self.search_fields, self.page_size)
    }

    /// A keystroke in the search box. Filters locally right away (client
    /// mode), goes back to page 1 unless the page is pinned, and forwards
    /// the term once typing pauses.
    ///
    /// Forwarding needs a `LocalSet`.
    pub fn search(&mut self, term: &str) {
        self.internal.search_term = term.to_string();
        if self.controlled.page.is_none() {
            self.internal.page = 1;
        }
        if let Some(on_search) = self.handlers.on_search_change.clone() {
            let term = term.to_string();
            self.search_timer.schedule(async move { on_search(term) });
        }
    }

    /// Go to `page`, clamped to the valid range.
    pub fn change_page(&mut self, page: usize) {
        let view = self.view();
        let page = page.clamp(1, view.total_pages);
        match &self.handlers.on_page_change {
            Some(on_page) => on_page(page),
            None => self.internal.page = page,
        }
    }

    /// A header click. Returns false for unknown or non-sortable columns.
    pub fn click_column(&mut self, key: &str) -> bool {
        let current = effective_state(&self.internal, &self.controlled).sort;
        let Some(next) = click(&self.columns, &current, key) else {
            return false;
        };
        match &self.handlers.on_sort_change {
            Some(on_sort) => on_sort(next),
            None => self.internal.sort = next,
        }
        self.change_page(1);
        true
    }
}
