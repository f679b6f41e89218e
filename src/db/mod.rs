pub mod dynamo;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::{AttrValue, InventoryRecord};

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the request. Handlers answer these with a 400 carrying
    /// the message.
    #[error("{0}")]
    Rejected(String),

    /// The request never got a service answer (network, credentials, timeout).
    #[error("store unreachable: {0}")]
    Transport(String),

    /// The store answered with something that is not a valid attribute value.
    #[error("undecodable store value: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Cursor handed out by a partial scan. Only the store that produced it can read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationToken(pub(crate) InventoryRecord);

#[derive(Debug, Default)]
pub struct ScanPage {
    pub items: Vec<InventoryRecord>,
    pub next: Option<ContinuationToken>,
}

/// The key-value table behind the function.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>>;

    /// Unconditional upsert.
    async fn put(&self, record: &InventoryRecord) -> StoreResult<()>;

    /// Sets one attribute of an existing record and returns the attributes that
    /// changed, with their new values.
    async fn update(
        &self,
        inventory_id: &str,
        attribute: &str,
        value: &AttrValue,
    ) -> StoreResult<InventoryRecord>;

    /// Returns the record as it was before deletion, if there was one.
    async fn delete(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>>;

    async fn scan(&self, start: Option<ContinuationToken>) -> StoreResult<ScanPage>;
}

/// Scans the whole table, following continuation tokens one page at a time.
pub async fn fetch_all_inventories(store: &dyn InventoryStore) -> StoreResult<Vec<InventoryRecord>> {
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = store.scan(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(pages, count = items.len(), "Scan complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> InventoryRecord {
        let mut record = InventoryRecord::new();
        record.insert("inventoryId".into(), id.into());
        record
    }

    #[tokio::test]
    async fn empty_table_yields_no_items() {
        let store = MemoryStore::new(10);
        let items = fetch_all_inventories(&store).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn every_page_is_collected() {
        for page_size in [1, 2, 3, 7, 100] {
            let store = MemoryStore::new(page_size);
            for i in 0..7 {
                store.put(&record(&format!("item-{i}"))).await.unwrap();
            }

            let items = fetch_all_inventories(&store).await.unwrap();
            assert_eq!(items.len(), 7, "page size {page_size}");

            let mut ids: Vec<&str> = items
                .iter()
                .filter_map(|r| r["inventoryId"].as_str())
                .collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 7, "no duplicates across pages (page size {page_size})");
        }
    }
}
