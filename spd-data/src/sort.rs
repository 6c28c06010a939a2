//! Column sort state and the click-to-sort cycle.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

/// Which column a table is sorted by, if any.
///
/// A key without a direction (or a direction without a key) never exists:
/// [`SortState::new`] collapses both to "unsorted".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SortState {
    key: Option<String>,
    direction: SortDirection,
}

impl SortState {
    pub fn new(key: Option<String>, direction: SortDirection) -> Self {
        match key {
            Some(key) if direction != SortDirection::None => Self {
                key: Some(key),
                direction,
            },
            _ => Self::unsorted(),
        }
    }

    pub fn unsorted() -> Self {
        Self {
            key: None,
            direction: SortDirection::None,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(Some(key.into()), SortDirection::Ascending)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(Some(key.into()), SortDirection::Descending)
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn is_sorted(&self) -> bool {
        self.key.is_some()
    }

    /// State after a click on column `key`.
    ///
    /// A new column starts ascending; the active column goes ascending ->
    /// descending -> unsorted.
    pub fn next(&self, key: &str) -> SortState {
        if self.key() != Some(key) {
            return SortState::ascending(key);
        }
        match self.direction {
            SortDirection::Ascending => SortState::descending(key),
            SortDirection::Descending | SortDirection::None => SortState::unsorted(),
        }
    }
}

/// A table column declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub header: String,
    pub sortable: bool,
}

impl Column {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            sortable: true,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// Apply a header click. Clicks on unknown or non-sortable columns return
/// `None` and leave the sort alone.
pub fn click(columns: &[Column], current: &SortState, key: &str) -> Option<SortState> {
    columns
        .iter()
        .find(|c| c.key == key)
        .filter(|c| c.sortable)
        .map(|c| current.next(&c.key))
}
