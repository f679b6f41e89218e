use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{ContinuationToken, InventoryStore, ScanPage, StoreError, StoreResult};
use crate::models::{AttrValue, InventoryRecord, INVENTORY_ID};

/// In-process table keyed by `inventoryId`, scanned in insertion order.
///
/// Rejects the same requests DynamoDB rejects for this table so handlers behave
/// the same against either store.
#[derive(Debug)]
pub struct MemoryStore {
    table: RwLock<IndexMap<String, InventoryRecord>>,
    page_size: usize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            table: RwLock::new(IndexMap::new()),
            page_size: page_size.max(1),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }
}

fn check_key(inventory_id: &str) -> StoreResult<()> {
    if inventory_id.is_empty() {
        return Err(StoreError::Rejected(format!(
            "One or more parameter values are not valid. The AttributeValue for a key attribute cannot contain an empty string value. Key: {INVENTORY_ID}"
        )));
    }
    Ok(())
}

fn key_of(record: &InventoryRecord) -> StoreResult<String> {
    match record.get(INVENTORY_ID) {
        Some(AttrValue::String(id)) => check_key(id).map(|()| id.clone()),
        Some(other) => Err(StoreError::Rejected(format!(
            "One or more parameter values were invalid: Type mismatch for key {INVENTORY_ID} expected: S actual: {}",
            other.type_name()
        ))),
        None => Err(StoreError::Rejected(format!(
            "One or more parameter values were invalid: Missing the key {INVENTORY_ID} in the item"
        ))),
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>> {
        check_key(inventory_id)?;
        Ok(self.table.read().await.get(inventory_id).cloned())
    }

    async fn put(&self, record: &InventoryRecord) -> StoreResult<()> {
        let key = key_of(record)?;
        self.table.write().await.insert(key, record.clone());
        Ok(())
    }

    async fn update(
        &self,
        inventory_id: &str,
        attribute: &str,
        value: &AttrValue,
    ) -> StoreResult<InventoryRecord> {
        check_key(inventory_id)?;
        if attribute == INVENTORY_ID {
            return Err(StoreError::Rejected(format!(
                "One or more parameter values were invalid: Cannot update attribute {INVENTORY_ID}. This attribute is part of the key"
            )));
        }

        let mut table = self.table.write().await;
        let record = table
            .get_mut(inventory_id)
            .ok_or_else(|| StoreError::Rejected("The conditional request failed".to_string()))?;
        record.insert(attribute.to_string(), value.clone());

        let mut updated = InventoryRecord::new();
        updated.insert(attribute.to_string(), value.clone());
        Ok(updated)
    }

    async fn delete(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>> {
        check_key(inventory_id)?;
        Ok(self.table.write().await.shift_remove(inventory_id))
    }

    async fn scan(&self, start: Option<ContinuationToken>) -> StoreResult<ScanPage> {
        let table = self.table.read().await;

        let offset = match start {
            None => 0,
            Some(ContinuationToken(key)) => {
                let last = key
                    .get(INVENTORY_ID)
                    .and_then(AttrValue::as_str)
                    .ok_or_else(|| {
                        StoreError::Rejected("The provided starting key is invalid".to_string())
                    })?;
                // A cursor whose item was deleted mid-scan ends the scan.
                match table.get_index_of(last) {
                    Some(index) => index + 1,
                    None => table.len(),
                }
            }
        };

        let end = (offset + self.page_size).min(table.len());
        let items: Vec<InventoryRecord> = table
            .values()
            .skip(offset)
            .take(end.saturating_sub(offset))
            .cloned()
            .collect();

        let next = if end < table.len() {
            table.get_index(end - 1).map(|(id, _)| {
                let mut key = InventoryRecord::new();
                key.insert(INVENTORY_ID.to_string(), AttrValue::String(id.clone()));
                ContinuationToken(key)
            })
        } else {
            None
        };

        Ok(ScanPage { items, next })
    }
}
