use bigdecimal::{BigDecimal, ToPrimitive};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::error::{AppError, AppResult};
use crate::models::AttrValue;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Value types the JSON body cannot carry.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("values of type {0} are not JSON serializable")]
    Unsupported(&'static str),
    #[error("number {0} has no JSON representation")]
    Number(BigDecimal),
}

/// Response envelope handed back to API Gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

impl ApiGatewayResponse {
    /// Envelope whose body is a plain JSON string, e.g. `"404 Not Found"`.
    pub fn message(status_code: u16, message: &str) -> Self {
        Self::with_body(status_code, Value::String(message.to_string()).to_string())
    }

    fn with_body(status_code: u16, body: String) -> Self {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Parses the body back into JSON. Test helper for asserting on responses.
    #[cfg(test)]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body is JSON")
    }
}

/// Normalizes `body` and wraps it into an envelope.
pub fn build_response(status_code: u16, body: &AttrValue) -> AppResult<ApiGatewayResponse> {
    let json = normalize(body)?;
    Ok(ApiGatewayResponse::with_body(
        status_code,
        serde_json::to_string(&json).map_err(AppError::Response)?,
    ))
}

/// Pre-serialization pass over a body: decimals with no fractional part become
/// integers, every other decimal becomes a float.
pub fn normalize(value: &AttrValue) -> Result<Value, NormalizeError> {
    Ok(match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::Number(d) => Value::Number(normalize_decimal(d)?),
        AttrValue::String(s) => Value::String(s.clone()),
        AttrValue::List(items) => Value::Array(
            items
                .iter()
                .map(normalize)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttrValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), normalize(v)?)))
                .collect::<Result<serde_json::Map<_, _>, NormalizeError>>()?,
        ),
        // JSON has no set type; members go out as an array in store order.
        AttrValue::StringSet(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttrValue::NumberSet(items) => Value::Array(
            items
                .iter()
                .map(|d| normalize_decimal(d).map(Value::Number))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttrValue::Binary(_) | AttrValue::BinarySet(_) => {
            return Err(NormalizeError::Unsupported(value.type_name()))
        }
    })
}

fn normalize_decimal(d: &BigDecimal) -> Result<Number, NormalizeError> {
    let number = if d.is_integer() {
        let (digits, _) = d.with_scale(0).into_bigint_and_exponent();
        digits.to_string().parse::<Number>().ok()
    } else {
        d.to_f64().and_then(Number::from_f64)
    };
    number.ok_or_else(|| NormalizeError::Number(d.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryRecord;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(raw: &str) -> AttrValue {
        AttrValue::Number(BigDecimal::from_str(raw).unwrap())
    }

    #[test]
    fn integral_decimal_serializes_as_integer() {
        let response = build_response(200, &dec("10")).unwrap();
        assert_eq!(response.body, "10");

        let response = build_response(200, &dec("10.000")).unwrap();
        assert_eq!(response.body, "10");
    }

    #[test]
    fn fractional_decimal_serializes_as_float() {
        let response = build_response(200, &dec("10.5")).unwrap();
        assert_eq!(response.body, "10.5");
    }

    #[test]
    fn negative_and_huge_integers() {
        assert_eq!(normalize(&dec("-42")).unwrap(), json!(-42));
        assert_eq!(
            normalize(&dec("18446744073709551615")).unwrap(),
            json!(18446744073709551615u64)
        );

        let response = build_response(200, &dec("100000000000000000000")).unwrap();
        assert_eq!(response.body, "100000000000000000000");

        let response = build_response(200, &dec("12345678901234567890123456789012345678")).unwrap();
        assert_eq!(response.body, "12345678901234567890123456789012345678");

        let response = build_response(200, &dec("1E+30")).unwrap();
        assert_eq!(response.body, format!("1{}", "0".repeat(30)));
    }

    #[test]
    fn tiny_fractions_serialize_as_floats() {
        let response = build_response(200, &dec("1E-40")).unwrap();
        let parsed: f64 = response.body.parse().unwrap();
        assert!((parsed - 1e-40).abs() < 1e-50);
        assert!(!response.body.contains("0000000000"));
    }

    #[test]
    fn nested_numbers_are_normalized() {
        let mut record = InventoryRecord::new();
        record.insert("inventoryId".into(), "abc".into());
        record.insert("qty".into(), dec("5"));
        record.insert("price".into(), dec("19.99"));
        record.insert("sizes".into(), AttrValue::NumberSet(vec![BigDecimal::from(1)]));
        record.insert("tags".into(), AttrValue::StringSet(vec!["new".into()]));

        let value = normalize(&AttrValue::Map(record)).unwrap();
        assert_eq!(
            value,
            json!({"inventoryId": "abc", "qty": 5, "price": 19.99, "sizes": [1], "tags": ["new"]})
        );
    }

    #[test]
    fn binary_values_are_not_serializable() {
        let err = normalize(&AttrValue::List(vec![AttrValue::Binary(vec![1, 2])])).unwrap_err();
        assert!(matches!(err, NormalizeError::Unsupported("B")));
    }

    #[test]
    fn envelope_shape() {
        let response = ApiGatewayResponse::message(404, "404 Not Found");
        assert_eq!(response.body, "\"404 Not Found\"");
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(
            wire,
            json!({
                "statusCode": 404,
                "headers": {"Content-Type": "application/json"},
                "body": "\"404 Not Found\"",
            })
        );
    }
}
