use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::work_entry::Model as WorkEntry;
use crate::errors::ServiceError;

use super::{DateOrder, EntryFilter, NewWorkEntry, WorkEntryStore};

/// Process-local store, mostly for tests and demos. Entries are kept in
/// insertion order so equal dates sort stably.
#[derive(Debug, Default)]
pub struct InMemoryWorkEntryStore {
    entries: RwLock<Vec<WorkEntry>>,
}

impl InMemoryWorkEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with pre-built rows, e.g. legacy data with
    /// non-canonical item names.
    pub fn with_entries(entries: Vec<WorkEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl WorkEntryStore for InMemoryWorkEntryStore {
    async fn insert(&self, entry: NewWorkEntry) -> Result<WorkEntry, ServiceError> {
        let model = entry.into_model(Uuid::new_v4());
        self.entries.write().await.push(model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkEntry>, ServiceError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn find(&self, filter: &EntryFilter, order: DateOrder) -> Result<Vec<WorkEntry>, ServiceError> {
        let entries = self.entries.read().await;
        let mut found: Vec<WorkEntry> = entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        match order {
            DateOrder::Ascending => found.sort_by_key(|e| e.date),
            DateOrder::Descending => found.sort_by(|a, b| b.date.cmp(&a.date)),
        }
        Ok(found)
    }

    async fn update(&self, entry: &WorkEntry) -> Result<WorkEntry, ServiceError> {
        let mut entries = self.entries.write().await;
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| ServiceError::NotFound(format!("work entry {} not found", entry.id)))?;
        *slot = entry.clone();
        Ok(entry.clone())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, ServiceError> {
        Ok(self.entries.read().await.iter().any(|e| e.name == name))
    }

    async fn distinct_names(&self) -> Result<Vec<String>, ServiceError> {
        let entries = self.entries.read().await;
        let names: BTreeSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::test_support::{at, entry};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn find_is_stable_for_equal_dates() {
        let first = entry("A", dec!(1), dec!(0), at(2024, 6, 10, 9));
        let second = entry("A", dec!(2), dec!(0), at(2024, 6, 10, 9));
        let store = InMemoryWorkEntryStore::with_entries(vec![first.clone(), second.clone()]);

        let found = store.find(&EntryFilter::all(), DateOrder::Ascending).await.unwrap();
        assert_eq!(found[0].id, first.id);
        assert_eq!(found[1].id, second.id);
    }

    #[tokio::test]
    async fn update_requires_existing_id() {
        let store = InMemoryWorkEntryStore::new();
        let ghost = entry("A", dec!(1), dec!(0), at(2024, 6, 10, 9));
        assert!(matches!(store.update(&ghost).await, Err(ServiceError::NotFound(_))));
    }
}
