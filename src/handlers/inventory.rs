use std::time::Instant;

use tracing::{info, warn};

use crate::{
    db::{self, InventoryStore, StoreError},
    error::AppResult,
    models::{
        build_response, ApiGatewayResponse, AttrValue, DeleteInventory, InventoryRecord,
        UpdateInventory, INVENTORY_ID,
    },
};

// ── Get one ───────────────────────────────────────────────────────────────────

/// A missing record is still a 200, with a `null` body.
pub async fn get_inventory(
    store: &dyn InventoryStore,
    inventory_id: &str,
) -> AppResult<ApiGatewayResponse> {
    let start = Instant::now();
    let record = match store.get(inventory_id).await {
        Ok(record) => record,
        Err(err) => return rejected("get", err),
    };

    info!(
        inventory_id,
        found = record.is_some(),
        elapsed_ms = start.elapsed().as_millis(),
        "Fetched inventory"
    );

    build_response(200, &record.into())
}

// ── Get all ───────────────────────────────────────────────────────────────────

pub async fn get_inventories(store: &dyn InventoryStore) -> AppResult<ApiGatewayResponse> {
    let start = Instant::now();
    let records = match db::fetch_all_inventories(store).await {
        Ok(records) => records,
        Err(err) => return rejected("scan", err),
    };

    info!(
        count = records.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Listed inventories"
    );

    let mut body = InventoryRecord::new();
    body.insert(
        "inventories".to_string(),
        AttrValue::List(records.into_iter().map(AttrValue::Map).collect()),
    );
    build_response(200, &AttrValue::Map(body))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn save_inventory(
    store: &dyn InventoryStore,
    record: InventoryRecord,
) -> AppResult<ApiGatewayResponse> {
    let start = Instant::now();
    if let Err(err) = store.put(&record).await {
        return rejected("save", err);
    }

    info!(
        inventory_id = record.get(INVENTORY_ID).and_then(AttrValue::as_str),
        attributes = record.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Saved inventory"
    );

    build_response(200, &operation_body("SAVE", "Item", record.into()))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn modify_inventory(
    store: &dyn InventoryStore,
    request: UpdateInventory,
) -> AppResult<ApiGatewayResponse> {
    let start = Instant::now();
    let updated = match store
        .update(&request.inventory_id, &request.update_key, &request.update_value)
        .await
    {
        Ok(updated) => updated,
        Err(err) => return rejected("update", err),
    };

    info!(
        inventory_id = %request.inventory_id,
        attribute = %request.update_key,
        elapsed_ms = start.elapsed().as_millis(),
        "Updated inventory"
    );

    build_response(
        200,
        &operation_body("UPDATE", "UpdatedAttributes", updated.into()),
    )
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_inventory(
    store: &dyn InventoryStore,
    request: DeleteInventory,
) -> AppResult<ApiGatewayResponse> {
    let start = Instant::now();
    let previous = match store.delete(&request.inventory_id).await {
        Ok(previous) => previous,
        Err(err) => return rejected("delete", err),
    };

    info!(
        inventory_id = %request.inventory_id,
        existed = previous.is_some(),
        elapsed_ms = start.elapsed().as_millis(),
        "Deleted inventory"
    );

    build_response(200, &operation_body("DELETE", "Item", previous.into()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn operation_body(operation: &str, field: &str, value: AttrValue) -> AttrValue {
    let mut body = InventoryRecord::new();
    body.insert("Operation".to_string(), operation.into());
    body.insert("Message".to_string(), "SUCCESS".into());
    body.insert(field.to_string(), value);
    AttrValue::Map(body)
}

/// Store rejections are answered here with the store's message. Anything else
/// goes up to the dispatcher.
fn rejected(operation: &'static str, err: StoreError) -> AppResult<ApiGatewayResponse> {
    match err {
        StoreError::Rejected(message) => {
            warn!(operation, error = %message, "Store rejected request");
            Ok(ApiGatewayResponse::message(400, &message))
        }
        other => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::AppError;
    use async_trait::async_trait;
    use serde_json::json;

    fn record(id: &str) -> InventoryRecord {
        let mut record = InventoryRecord::new();
        record.insert(INVENTORY_ID.into(), id.into());
        record.insert("qty".into(), AttrValue::Number(5.into()));
        record
    }

    /// Store whose every call fails with the given error.
    struct FailingStore(fn() -> StoreError);

    #[async_trait]
    impl InventoryStore for FailingStore {
        async fn get(&self, _: &str) -> db::StoreResult<Option<InventoryRecord>> {
            Err((self.0)())
        }
        async fn put(&self, _: &InventoryRecord) -> db::StoreResult<()> {
            Err((self.0)())
        }
        async fn update(&self, _: &str, _: &str, _: &AttrValue) -> db::StoreResult<InventoryRecord> {
            Err((self.0)())
        }
        async fn delete(&self, _: &str) -> db::StoreResult<Option<InventoryRecord>> {
            Err((self.0)())
        }
        async fn scan(&self, _: Option<db::ContinuationToken>) -> db::StoreResult<db::ScanPage> {
            Err((self.0)())
        }
    }

    #[tokio::test]
    async fn get_missing_is_success_with_null() {
        let store = MemoryStore::new(10);
        let response = get_inventory(&store, "nope").await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "null");
    }

    #[tokio::test]
    async fn save_echoes_the_record() {
        let store = MemoryStore::new(10);
        let response = save_inventory(&store, record("abc")).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.json(),
            json!({
                "Operation": "SAVE",
                "Message": "SUCCESS",
                "Item": {"inventoryId": "abc", "qty": 5},
            })
        );
    }

    #[tokio::test]
    async fn update_reports_only_the_changed_attribute() {
        let store = MemoryStore::new(10);
        store.put(&record("abc")).await.unwrap();

        let request = UpdateInventory {
            inventory_id: "abc".into(),
            update_key: "qty".into(),
            update_value: AttrValue::Number(9.into()),
        };
        let response = modify_inventory(&store, request).await.unwrap();
        assert_eq!(
            response.json(),
            json!({"Operation": "UPDATE", "Message": "SUCCESS", "UpdatedAttributes": {"qty": 9}})
        );
    }

    #[tokio::test]
    async fn delete_returns_previous_record() {
        let store = MemoryStore::new(10);
        store.put(&record("abc")).await.unwrap();

        let request = DeleteInventory { inventory_id: "abc".into() };
        let response = delete_inventory(&store, request).await.unwrap();
        assert_eq!(response.json()["Item"], json!({"inventoryId": "abc", "qty": 5}));
        assert!(store.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejection_becomes_400_with_store_message() {
        let store = FailingStore(|| StoreError::Rejected("Requested resource not found".into()));

        for response in [
            get_inventory(&store, "a").await.unwrap(),
            get_inventories(&store).await.unwrap(),
            save_inventory(&store, record("a")).await.unwrap(),
        ] {
            assert_eq!(response.status_code, 400);
            assert_eq!(response.json(), json!("Requested resource not found"));
        }
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let store = FailingStore(|| StoreError::Transport("connection refused".into()));
        let err = get_inventory(&store, "a").await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Transport(_))));
    }
}
