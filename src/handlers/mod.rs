pub mod http;
pub mod inventory;

use serde_json::Value;
use tracing::{error, info};

use crate::{
    db::InventoryStore,
    error::AppResult,
    models::{
        create_payload, ApiGatewayResponse, DeleteInventory, RequestEnvelope, UpdateInventory,
        INVENTORY_ID,
    },
};

pub const STATUS_PATH: &str = "/status";
pub const INVENTORY_PATH: &str = "/inventory";
pub const INVENTORIES_PATH: &str = "/inventories";

pub const STATUS_MESSAGE: &str = "Service is operational";
pub const NOT_FOUND_MESSAGE: &str = "404 Not Found";
pub const GENERIC_ERROR_MESSAGE: &str = "Error processing request";

pub fn health() -> ApiGatewayResponse {
    ApiGatewayResponse::message(200, STATUS_MESSAGE)
}

/// Entry point for one invocation. Always produces a response: any error from
/// parsing or from a handler is logged and answered with the generic 400.
pub async fn dispatch(store: &dyn InventoryStore, event: Value) -> ApiGatewayResponse {
    info!(event = %event, "Request event");

    match route(store, event).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Error processing request");
            ApiGatewayResponse::message(400, GENERIC_ERROR_MESSAGE)
        }
    }
}

async fn route(store: &dyn InventoryStore, event: Value) -> AppResult<ApiGatewayResponse> {
    let request = RequestEnvelope::from_event(event)?;
    let method = request.http_method.as_deref().unwrap_or_default();
    let path = request.path.as_deref().unwrap_or_default();

    match (method, path) {
        ("GET", STATUS_PATH) => Ok(health()),
        ("GET", INVENTORY_PATH) => {
            let inventory_id = request.query_param(INVENTORY_ID)?;
            inventory::get_inventory(store, inventory_id).await
        }
        ("GET", INVENTORIES_PATH) => inventory::get_inventories(store).await,
        ("POST", INVENTORY_PATH) => {
            let record = create_payload(request.json_body()?)?;
            inventory::save_inventory(store, record).await
        }
        ("PATCH", INVENTORY_PATH) => {
            let update = UpdateInventory::from_body(request.json_body()?)?;
            inventory::modify_inventory(store, update).await
        }
        ("DELETE", INVENTORY_PATH) => {
            let delete = DeleteInventory::from_body(request.json_body()?)?;
            inventory::delete_inventory(store, delete).await
        }
        _ => Ok(ApiGatewayResponse::message(404, NOT_FOUND_MESSAGE)),
    }
}
