//! In-memory implementation of DataService for testing and development

use crate::core::entity::Resource;
use crate::core::service::DataService;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

/// In-memory data service implementation
///
/// Rows are kept ordered by identifier and identifiers are assigned
/// sequentially from 1. Uses RwLock for thread-safe access; clones share
/// the same table.
pub struct InMemoryDataService<T> {
    table: Arc<RwLock<Table<T>>>,
}

impl<T> Clone for InMemoryDataService<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<T> InMemoryDataService<T> {
    /// Create a new, empty in-memory data service
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl<T> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Resource> DataService<T> for InMemoryDataService<T> {
    async fn create(&self, mut entity: T) -> Result<T> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let id = table.next_id;
        table.next_id += 1;
        entity.set_id(id);
        table.rows.insert(id, entity.clone());

        Ok(entity)
    }

    async fn get(&self, id: i64) -> Result<Option<T>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table.rows.values().cloned().collect())
    }

    async fn list_matching(&self, predicate: &(dyn for<'x> Fn(&'x T) -> bool + Send + Sync)) -> Result<Vec<T>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table
            .rows
            .values()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, mut entity: T) -> Result<Option<T>> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        entity.set_id(id);
        *row = entity.clone();

        Ok(Some(entity))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(table.rows.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table.rows.len())
    }
}
