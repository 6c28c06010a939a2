//! Search, sort and pagination over in-memory rows.
//!
//! `process` is the whole pipeline: filter, then a stable sort, then one
//! page. Page clamping is the caller's job; a page past the end yields an
//! empty slice.

use crate::record::{FieldValue, Record};
use crate::sort::{SortDirection, SortState};
use std::cmp::Ordering;

/// One page of processed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Never less than 1, even for an empty match set.
    pub total_pages: usize,
    pub total_matching: usize,
}

/// Case-insensitive substring match of `term` against any of `fields`.
/// A blank term matches everything.
pub fn matches_search<T: Record, S: AsRef<str>>(item: &T, term: &str, fields: &[S]) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields.iter().any(|key| {
        item.field(key.as_ref())
            .map(|value| value.search_text().to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

pub fn filter_items<T: Record + Clone, S: AsRef<str>>(items: &[T], term: &str, fields: &[S]) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches_search(*item, term, fields))
        .cloned()
        .collect()
}

/// Compare strings alphabetically ignoring case; on a case-only difference
/// the lowercase form comes first.
///
/// Letters compare by the code points of their lowercase form, not by a
/// locale collation table, so accented letters sort after `z`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn compare_present(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (FieldValue::Text(x), FieldValue::Text(y)) => locale_cmp(x, y),
        (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
    }
}

/// Ordering of two rows under `sort`. Nulls come first in either direction.
pub fn compare_by<T: Record>(a: &T, b: &T, sort: &SortState) -> Ordering {
    let Some(key) = sort.key() else {
        return Ordering::Equal;
    };
    match (a.field(key), b.field(key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            let ord = compare_present(x, y);
            if sort.direction() == SortDirection::Descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

/// Stable sort; an unsorted state keeps input order.
pub fn sort_items<T: Record>(mut items: Vec<T>, sort: &SortState) -> Vec<T> {
    if sort.is_sorted() {
        items.sort_by(|a, b| compare_by(a, b, sort));
    }
    items
}

/// `max(1, ceil(total / page_size))`.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Rows of the 1-based `page`.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let stop = start.saturating_add(page_size).min(items.len());
    items[start..stop].to_vec()
}

pub fn process<T: Record + Clone, S: AsRef<str>>(
    items: &[T],
    search_term: &str,
    search_fields: &[S],
    sort: &SortState,
    page: usize,
    page_size: usize,
) -> ListPage<T> {
    let matching = sort_items(filter_items(items, search_term, search_fields), sort);
    ListPage {
        items: paginate(&matching, page, page_size),
        total_pages: total_pages(matching.len(), page_size),
        total_matching: matching.len(),
    }
}
