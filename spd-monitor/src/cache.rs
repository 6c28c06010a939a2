use log::info;
use spd_core::api::{ApiResult, Backend};
use spd_core::plant::Plant;

/// Plants fetched per request while filling the cache.
const LOAD_BATCH: usize = 100;

/// Every plant, held locally for backends that cannot search.
///
/// Stale after any plant mutation; the next search reloads it.
#[derive(Debug, Default)]
pub struct PlantCache {
    plants: Vec<Plant>,
    fresh: bool,
}

impl PlantCache {
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// The cached plants, reloading them first if stale.
    pub async fn ensure_fresh<B: Backend + ?Sized>(&mut self, backend: &B) -> ApiResult<&[Plant]> {
        if !self.fresh {
            let mut plants = Vec::new();
            loop {
                let page = backend.list_plants(LOAD_BATCH, plants.len(), None).await?;
                let received = page.items.len();
                plants.extend(page.items);
                if received == 0 || plants.len() >= page.count {
                    break;
                }
            }
            info!("[SPD] cache: loaded {} plants", plants.len());
            self.plants = plants;
            self.fresh = true;
        }
        Ok(&self.plants)
    }
}
