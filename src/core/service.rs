//! Persistence collaborator contract

use crate::core::entity::Resource;
use anyhow::Result;
use async_trait::async_trait;

/// Service trait for managing one resource type
///
/// Implementations provide the persistence half of a listing: they
/// materialize candidates, evaluating simple predicates while scanning so
/// the pipeline only sees entities that can still match. The service layer
/// is agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Resource>: Send + Sync {
    /// Create a new entity, assigning its identifier
    async fn create(&self, entity: T) -> Result<T>;

    /// Get an entity by ID
    async fn get(&self, id: i64) -> Result<Option<T>>;

    /// List all entities
    async fn list(&self) -> Result<Vec<T>>;

    /// List the entities accepted by `predicate`
    async fn list_matching(&self, predicate: &(dyn for<'x> Fn(&'x T) -> bool + Send + Sync)) -> Result<Vec<T>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|entity| predicate(entity))
            .collect())
    }

    /// Replace the entity stored under `id`, keeping that identifier
    ///
    /// Returns `None` when nothing is stored under `id`.
    async fn update(&self, id: i64, entity: T) -> Result<Option<T>>;

    /// Delete an entity, returning whether it existed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of stored entities
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}
