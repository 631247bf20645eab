use std::sync::Arc;

use tracing::info;

use crate::domain::Validate;
use crate::domain::search_params::ListingSearch;
use crate::error::Result;
use crate::ports::store::TableStore;
use crate::repository::{ListingRecord, Repository};

/// CRUD and search for one listing family.
pub struct ListingController<L> {
    repo: Repository<L>,
}

impl<L> Clone for ListingController<L> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<L: ListingRecord> ListingController<L> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// All listings when `search` is empty, the matching subset otherwise.
    pub async fn list(&self, search: &ListingSearch) -> Result<Vec<L>> {
        if search.is_empty() {
            return self.repo.find_all().await;
        }
        self.repo.search(search).await
    }

    pub async fn get(&self, id: &str) -> Result<L> {
        self.repo.get(id).await
    }

    pub async fn create(&self, input: L::New) -> Result<L> {
        let input = input.validate()?;
        let created = self.repo.create(&input).await?;
        info!(table = L::TABLE, "Listing created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: L::Patch) -> Result<L> {
        let patch = patch.validate()?;
        self.repo.get(id).await?;
        self.repo.update(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.get(id).await?;
        self.repo.delete(id).await?;
        info!(table = L::TABLE, id, "Listing deleted");
        Ok(())
    }
}
