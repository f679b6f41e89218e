use std::str::FromStr;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Attribute that identifies every inventory record.
pub const INVENTORY_ID: &str = "inventoryId";

/// One stored item, attribute order preserved as written.
pub type InventoryRecord = IndexMap<String, AttrValue>;

/// Value space of the key-value store. Numbers are kept as decimals exactly as the
/// store returns them; [`crate::models::normalize`] decides how they leave as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(BigDecimal),
    String(String),
    List(Vec<AttrValue>),
    Map(IndexMap<String, AttrValue>),
    StringSet(Vec<String>),
    NumberSet(Vec<BigDecimal>),
    Binary(Vec<u8>),
    BinarySet(Vec<Vec<u8>>),
}

impl AttrValue {
    /// Converts a request JSON value. JSON numbers become decimals with every
    /// digit of the literal kept.
    pub fn from_json(value: Value) -> AppResult<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(parse_decimal(&n.to_string())?),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            Value::Object(map) => Self::Map(record_from_json(map)?),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label, used in store rejection messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Number(_) => "N",
            Self::String(_) => "S",
            Self::List(_) => "L",
            Self::Map(_) => "M",
            Self::StringSet(_) => "SS",
            Self::NumberSet(_) => "NS",
            Self::Binary(_) => "B",
            Self::BinarySet(_) => "BS",
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<InventoryRecord> for AttrValue {
    fn from(value: InventoryRecord) -> Self {
        Self::Map(value)
    }
}

impl From<Option<InventoryRecord>> for AttrValue {
    fn from(value: Option<InventoryRecord>) -> Self {
        value.map_or(Self::Null, Self::Map)
    }
}

/// Converts a JSON object into a record, keeping its key order.
pub fn record_from_json(map: serde_json::Map<String, Value>) -> AppResult<InventoryRecord> {
    map.into_iter()
        .map(|(k, v)| Ok((k, AttrValue::from_json(v)?)))
        .collect()
}

fn parse_decimal(raw: &str) -> AppResult<BigDecimal> {
    BigDecimal::from_str(raw).map_err(|_| AppError::InvalidNumber(raw.to_string()))
}
