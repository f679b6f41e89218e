use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::models::{record_from_json, AttrValue, InventoryRecord, INVENTORY_ID};

/// The part of an API Gateway proxy event the router looks at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "httpMethod", default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "queryStringParameters", default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestEnvelope {
    pub fn from_event(event: Value) -> AppResult<Self> {
        serde_json::from_value(event).map_err(AppError::Event)
    }

    pub fn query_param(&self, name: &'static str) -> AppResult<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
            .ok_or(AppError::MissingField(name))
    }

    /// Parses the body as a JSON object.
    pub fn json_body(&self) -> AppResult<Map<String, Value>> {
        let raw = self.body.as_deref().ok_or(AppError::MissingField("body"))?;
        match serde_json::from_str(raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::InvalidField {
                field: "body",
                expected: "a JSON object",
            }),
        }
    }
}

/// Body of a POST: the full record to upsert.
pub fn create_payload(body: Map<String, Value>) -> AppResult<InventoryRecord> {
    record_from_json(body)
}

/// Body of a PATCH.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInventory {
    pub inventory_id: String,
    pub update_key: String,
    pub update_value: AttrValue,
}

impl UpdateInventory {
    pub fn from_body(mut body: Map<String, Value>) -> AppResult<Self> {
        let inventory_id = take_string(&mut body, INVENTORY_ID)?;
        let update_key = take_string(&mut body, "updateKey")?;
        let update_value = body
            .remove("updateValue")
            .ok_or(AppError::MissingField("updateValue"))?;
        Ok(Self {
            inventory_id,
            update_key,
            update_value: AttrValue::from_json(update_value)?,
        })
    }
}

/// Body of a DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteInventory {
    pub inventory_id: String,
}

impl DeleteInventory {
    pub fn from_body(mut body: Map<String, Value>) -> AppResult<Self> {
        Ok(Self {
            inventory_id: take_string(&mut body, INVENTORY_ID)?,
        })
    }
}

fn take_string(body: &mut Map<String, Value>, field: &'static str) -> AppResult<String> {
    match body.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(AppError::InvalidField {
            field,
            expected: "a string",
        }),
        None => Err(AppError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: Option<&str>) -> RequestEnvelope {
        RequestEnvelope {
            body: body.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn event_without_method_or_path_still_parses() {
        let env = RequestEnvelope::from_event(json!({"resource": "/"})).unwrap();
        assert!(env.http_method.is_none());
        assert!(env.path.is_none());
    }

    #[test]
    fn event_with_wrong_types_is_malformed() {
        let err = RequestEnvelope::from_event(json!({"httpMethod": 7})).unwrap_err();
        assert!(matches!(err, AppError::Event(_)));
    }

    #[test]
    fn null_query_parameters_mean_missing() {
        let env = RequestEnvelope::from_event(json!({
            "httpMethod": "GET",
            "path": "/inventory",
            "queryStringParameters": null,
        }))
        .unwrap();
        assert!(matches!(
            env.query_param("inventoryId"),
            Err(AppError::MissingField("inventoryId"))
        ));
    }

    #[test]
    fn malformed_body_is_a_json_error() {
        assert!(matches!(envelope(Some("{not json")).json_body(), Err(AppError::Json(_))));
        assert!(matches!(envelope(None).json_body(), Err(AppError::MissingField("body"))));
        assert!(matches!(
            envelope(Some("[1,2]")).json_body(),
            Err(AppError::InvalidField { field: "body", .. })
        ));
    }

    #[test]
    fn update_body_requires_all_three_fields() {
        let body = envelope(Some(r#"{"inventoryId":"a","updateKey":"qty","updateValue":null}"#))
            .json_body()
            .unwrap();
        let update = UpdateInventory::from_body(body).unwrap();
        assert_eq!(update.update_value, AttrValue::Null);

        let body = envelope(Some(r#"{"inventoryId":"a","updateKey":"qty"}"#))
            .json_body()
            .unwrap();
        assert!(matches!(
            UpdateInventory::from_body(body),
            Err(AppError::MissingField("updateValue"))
        ));
    }

    #[test]
    fn delete_body_requires_string_id() {
        let body = envelope(Some(r#"{"inventoryId":12}"#)).json_body().unwrap();
        assert!(matches!(
            DeleteInventory::from_body(body),
            Err(AppError::InvalidField { field: "inventoryId", .. })
        ));
    }
}
