//! Plant CRUD and the paged, searchable plant list.

use crate::cache::PlantCache;
use crate::notify::Notifier;
use log::{info, warn};
use spd_core::api::{ApiError, ApiResult, Backend, PlantPage};
use spd_core::plant::{Plant, PlantDraft};
use spd_data::list::{filter_items, sort_items, total_pages};
use spd_data::sort::SortState;
use spd_data::view::{Controlled, ServerTotals};

/// Fields a local plant search matches against.
pub const PLANT_SEARCH_FIELDS: [&str; 2] = ["name", "uid"];

/// Plant operations over a backend, with a local search fallback.
pub struct PlantService<B> {
    backend: B,
    cache: PlantCache,
}

impl<B: Backend> PlantService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: PlantCache::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// One page of plants matching `search`, in `sort` order. Unsorted
    /// pages come straight from the backend when it can search; sorted
    /// pages are cut from the whole sorted collection, served by the cache.
    pub async fn list(
        &mut self,
        limit: usize,
        offset: usize,
        search: &str,
        sort: &SortState,
    ) -> ApiResult<PlantPage> {
        let term = search.trim();
        if !sort.is_sorted() {
            if term.is_empty() {
                return self.backend.list_plants(limit, offset, None).await;
            }
            if self.backend.supports_search() {
                return self.backend.list_plants(limit, offset, Some(term)).await;
            }
        }
        let ordered = self.ordered(term, sort).await?;
        Ok(PlantPage::from_slice(&ordered, limit, offset))
    }

    /// Zero-based position of `uid` in the listing for `search` and `sort`.
    pub async fn position(&mut self, uid: &str, search: &str, sort: &SortState) -> ApiResult<Option<usize>> {
        let ordered = self.ordered(search.trim(), sort).await?;
        Ok(ordered.iter().position(|p| p.uid == uid))
    }

    async fn ordered(&mut self, term: &str, sort: &SortState) -> ApiResult<Vec<Plant>> {
        let all = self.cache.ensure_fresh(&self.backend).await?;
        Ok(sort_items(filter_items(all, term, &PLANT_SEARCH_FIELDS), sort))
    }

    pub async fn get(&self, uid: &str) -> ApiResult<Plant> {
        self.backend.get_plant(uid).await
    }

    pub async fn create(&mut self, draft: &PlantDraft) -> ApiResult<Plant> {
        let draft = draft.validated()?;
        let result = self.backend.create_plant(&draft).await;
        self.cache.invalidate();
        result
    }

    pub async fn rename(&mut self, uid: &str, draft: &PlantDraft) -> ApiResult<Plant> {
        let draft = draft.validated()?;
        let result = self.backend.update_plant(uid, &draft).await;
        self.cache.invalidate();
        result
    }

    pub async fn delete(&mut self, uid: &str) -> ApiResult<()> {
        let result = self.backend.delete_plant(uid).await;
        self.cache.invalidate();
        result
    }
}

/// The plant list screen: one page at a time, search resets to page 1.
pub struct PlantList<B, N> {
    service: PlantService<B>,
    notifier: N,
    page_size: usize,
    plants: Vec<Plant>,
    total_items: usize,
    next_cursor: Option<String>,
    prev_cursor: Option<String>,
    current_page: usize,
    search_term: String,
    sort: SortState,
    loading: bool,
    error: Option<String>,
}

impl<B: Backend, N: Notifier> PlantList<B, N> {
    pub fn new(backend: B, notifier: N, page_size: usize) -> Self {
        Self {
            service: PlantService::new(backend),
            notifier,
            page_size: page_size.max(1),
            plants: Vec::new(),
            total_items: 0,
            next_cursor: None,
            prev_cursor: None,
            current_page: 1,
            search_term: String::new(),
            sort: SortState::unsorted(),
            loading: false,
            error: None,
        }
    }

    pub fn service(&self) -> &PlantService<B> {
        &self.service
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items, self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed load, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn has_prev_page(&self) -> bool {
        self.prev_cursor.is_some()
    }

    /// Totals for a server-mode table showing this list.
    pub fn table_totals(&self) -> ServerTotals {
        ServerTotals {
            total_items: self.total_items,
            total_pages: Some(self.total_pages()),
            has_next_page: Some(self.has_next_page()),
            has_prev_page: Some(self.has_prev_page()),
        }
    }

    /// Page and sort as pinned values for a table showing this list.
    pub fn controlled(&self) -> Controlled {
        Controlled {
            page: Some(self.current_page),
            sort: Some(self.sort.clone()),
        }
    }

    /// Reload the current page.
    pub async fn refresh(&mut self) {
        self.loading = true;
        let offset = (self.current_page - 1) * self.page_size;
        match self.service.list(self.page_size, offset, &self.search_term, &self.sort).await {
            Ok(page) => {
                info!(
                    "[SPD] plants: page {} has {} of {} plants",
                    self.current_page,
                    page.items.len(),
                    page.count
                );
                self.total_items = page.count;
                self.next_cursor = page.next_cursor;
                self.prev_cursor = page.prev_cursor;
                self.plants = page.items;
                self.error = None;
            }
            Err(e) => {
                warn!("[SPD] plants: failed to load plants: {}", e);
                self.error = Some(e.message().to_string());
                self.notifier.error("Failed to load plants");
            }
        }
        self.loading = false;
    }

    /// Move to `page`. Out-of-range pages and requests made while loading
    /// are ignored.
    pub async fn change_page(&mut self, page: usize) -> bool {
        if self.loading || page < 1 || page > self.total_pages() {
            return false;
        }
        self.current_page = page;
        self.refresh().await;
        true
    }

    /// New search term: back to page 1 and reload.
    pub async fn change_search(&mut self, term: &str) {
        if term == self.search_term {
            return;
        }
        self.search_term = term.to_string();
        self.current_page = 1;
        self.refresh().await;
    }

    pub async fn change_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.current_page = 1;
        self.refresh().await;
    }

    pub async fn create(&mut self, name: &str) -> ApiResult<Plant> {
        let result = self.service.create(&PlantDraft::new(name)).await;
        self.after_mutation(&result, "Plant created successfully", "Failed to create plant")
            .await;
        if let Ok(plant) = &result {
            self.current_page = self.page_of(&plant.uid, 1).await;
            self.refresh().await;
        }
        result
    }

    pub async fn rename(&mut self, uid: &str, name: &str) -> ApiResult<Plant> {
        let result = self.service.rename(uid, &PlantDraft::new(name)).await;
        self.after_mutation(&result, "Plant updated successfully", "Failed to update plant")
            .await;
        if let Ok(plant) = &result {
            self.current_page = self.page_of(&plant.uid, self.current_page).await;
            self.refresh().await;
        }
        result
    }

    pub async fn delete(&mut self, uid: &str) -> ApiResult<()> {
        let result = self.service.delete(uid).await;
        self.after_mutation(&result, "Plant deleted successfully", "Failed to delete plant")
            .await;
        if result.is_ok() {
            if self.plants.len() == 1 && self.current_page > 1 {
                self.current_page -= 1;
            }
            self.refresh().await;
        }
        result
    }

    /// The page showing `uid` under the current search and sort, or
    /// `fallback` when it is not listed.
    async fn page_of(&mut self, uid: &str, fallback: usize) -> usize {
        match self.service.position(uid, &self.search_term, &self.sort).await {
            Ok(Some(index)) => index / self.page_size + 1,
            Ok(None) => fallback,
            Err(e) => {
                warn!("[SPD] plants: cannot locate {}: {}", uid, e);
                fallback
            }
        }
    }

    /// Notify about a mutation's outcome. Validation errors stay with the
    /// caller; a plant that vanished triggers a reload.
    async fn after_mutation<T>(&mut self, result: &ApiResult<T>, success: &str, failure: &str) {
        match result {
            Ok(_) => self.notifier.success(success),
            Err(ApiError::Validation(_)) => {}
            Err(e) => {
                warn!("[SPD] plants: {}: {}", failure, e);
                self.notifier.error(failure);
                if e.is_not_found() {
                    self.refresh().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, Notice, RecordingNotifier, StubBackend};
    use std::rc::Rc;

    const NAMES: [&str; 12] = [
        "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
        "Lambda", "Mu",
    ];

    fn list(stub: &StubBackend) -> (PlantList<StubBackend, Rc<RecordingNotifier>>, Rc<RecordingNotifier>) {
        let notifier = Rc::new(RecordingNotifier::default());
        (PlantList::new(stub.clone(), notifier.clone(), 5), notifier)
    }

    #[tokio::test]
    async fn test_paging() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, _) = list(&stub);
        plants.refresh().await;
        assert_eq!(plants.total_pages(), 3);
        assert_eq!(plants.plants().len(), 5);
        assert!(plants.has_next_page());
        assert!(!plants.has_prev_page());

        assert!(plants.change_page(3).await);
        assert_eq!(plants.plants().len(), 2);
        assert!(!plants.change_page(4).await);
        assert!(!plants.change_page(0).await);
        assert_eq!(plants.current_page(), 3);
    }

    #[tokio::test]
    async fn test_search_resets_page_and_uses_cache_without_native_search() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, _) = list(&stub);
        plants.refresh().await;
        plants.change_page(2).await;

        plants.change_search("ta").await;
        assert_eq!(plants.current_page(), 1);
        let names: Vec<&str> = plants.plants().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Delta", "Zeta", "Eta", "Theta"]);
        assert_eq!(plants.total_items(), 6);
        assert_eq!(plants.total_pages(), 2);

        // Cache is reused until a mutation invalidates it.
        let before = stub.list_calls();
        plants.change_search("ppa").await;
        assert_eq!(stub.list_calls(), before);
        assert_eq!(plants.plants()[0].name, "Kappa");

        plants.create("Kappa Two").await.unwrap();
        plants.change_search("kappa").await;
        assert_eq!(plants.total_items(), 2);
    }

    #[tokio::test]
    async fn test_native_search_goes_to_backend() {
        let stub = StubBackend::with_plants(&NAMES);
        stub.state.borrow_mut().native_search = true;
        let (mut plants, _) = list(&stub);
        plants.change_search("mu").await;
        assert_eq!(plants.plants()[0].name, "Mu");
        assert!(stub.calls().contains(&Call::List {
            offset: 0,
            search: Some("mu".into())
        }));
    }

    fn names(plants: &PlantList<StubBackend, Rc<RecordingNotifier>>) -> Vec<String> {
        plants.plants().iter().map(|p| p.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_sorted_pages_concatenate_in_order() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, _) = list(&stub);
        plants.change_sort(SortState::descending("name")).await;
        assert_eq!(names(&plants), vec!["Zeta", "Theta", "Mu", "Lambda", "Kappa"]);

        let mut all = names(&plants);
        for page in 2..=plants.total_pages() {
            assert!(plants.change_page(page).await);
            all.extend(names(&plants));
        }
        let mut expected: Vec<String> = NAMES.iter().map(|n| n.to_string()).collect();
        expected.sort();
        expected.reverse();
        assert_eq!(all, expected);
    }

    #[tokio::test]
    async fn test_sorted_search_uses_whole_collection() {
        let stub = StubBackend::with_plants(&NAMES);
        stub.state.borrow_mut().native_search = true;
        let (mut plants, _) = list(&stub);
        plants.change_sort(SortState::ascending("name")).await;
        plants.change_search("ta").await;
        assert_eq!(names(&plants), vec!["Beta", "Delta", "Eta", "Iota", "Theta"]);
        assert!(plants.change_page(2).await);
        assert_eq!(names(&plants), vec!["Zeta"]);
    }

    #[tokio::test]
    async fn test_create_and_rename_jump_to_the_plants_page() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, _) = list(&stub);
        plants.change_sort(SortState::ascending("name")).await;

        // Omega lands eleventh by name.
        let created = plants.create("Omega").await.unwrap();
        assert_eq!(plants.current_page(), 3);
        assert!(names(&plants).contains(&"Omega".to_string()));

        plants.rename(&created.uid, "Aardvark").await.unwrap();
        assert_eq!(plants.current_page(), 1);
        assert_eq!(names(&plants)[0], "Aardvark");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_without_a_call() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, notifier) = list(&stub);
        let err = plants.create("   ").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(stub.calls().is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_notify_and_refresh() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, notifier) = list(&stub);
        plants.refresh().await;

        let created = plants.create("Nu").await.unwrap();
        assert_eq!(
            notifier.notices(),
            vec![Notice::Success("Plant created successfully".into())]
        );
        assert_eq!(plants.total_items(), 13);

        plants.rename(&created.uid, "Nu Prime").await.unwrap();
        plants.delete(&created.uid).await.unwrap();
        assert_eq!(plants.total_items(), 12);
    }

    #[tokio::test]
    async fn test_vanished_plant_refreshes_list() {
        let stub = StubBackend::with_plants(&NAMES);
        let (mut plants, notifier) = list(&stub);
        plants.refresh().await;
        stub.clear_calls();

        let err = plants.rename("ghost", "Anything").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(notifier.errors(), vec!["Failed to update plant".to_string()]);
        assert_eq!(stub.list_calls(), 1);
    }
}
