use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use bigdecimal::BigDecimal;
use tracing::info;

use super::{ContinuationToken, InventoryStore, ScanPage, StoreError, StoreResult};
use crate::config::Config;
use crate::models::{AttrValue, InventoryRecord, INVENTORY_ID};

type Item = HashMap<String, AttributeValue>;

/// DynamoDB table addressed by name. The client is cheap to clone and is built
/// once per process.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Loads credentials from the environment and points the client at the
    /// configured region, or at `DYNAMODB_ENDPOINT_URL` when set.
    pub async fn connect(config: &Config) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(url) = &config.endpoint_url {
            info!(endpoint = %url, "Using custom DynamoDB endpoint");
            builder = builder.endpoint_url(url);
        }

        Self::new(Client::from_conf(builder.build()), config.table_name.clone())
    }

    fn key(inventory_id: &str) -> AttributeValue {
        AttributeValue::S(inventory_id.to_string())
    }
}

#[async_trait]
impl InventoryStore for DynamoStore {
    async fn get(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(INVENTORY_ID, Self::key(inventory_id))
            .send()
            .await
            .map_err(store_error)?;

        output.item.map(record_from_item).transpose()
    }

    async fn put(&self, record: &InventoryRecord) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item_from_record(record)))
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update(
        &self,
        inventory_id: &str,
        attribute: &str,
        value: &AttrValue,
    ) -> StoreResult<InventoryRecord> {
        // Names go through placeholders so reserved words like `name` work.
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(INVENTORY_ID, Self::key(inventory_id))
            .update_expression("SET #attr = :value")
            .condition_expression("attribute_exists(#key)")
            .expression_attribute_names("#attr", attribute)
            .expression_attribute_names("#key", INVENTORY_ID)
            .expression_attribute_values(":value", to_dynamo(value))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(store_error)?;

        output
            .attributes
            .map(record_from_item)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    async fn delete(&self, inventory_id: &str) -> StoreResult<Option<InventoryRecord>> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key(INVENTORY_ID, Self::key(inventory_id))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(store_error)?;

        output.attributes.map(record_from_item).transpose()
    }

    async fn scan(&self, start: Option<ContinuationToken>) -> StoreResult<ScanPage> {
        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .set_exclusive_start_key(start.map(|token| item_from_record(&token.0)))
            .send()
            .await
            .map_err(store_error)?;

        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(record_from_item)
            .collect::<StoreResult<Vec<_>>>()?;

        let next = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(record_from_item)
            .transpose()?
            .map(ContinuationToken);

        Ok(ScanPage { items, next })
    }
}

/// Service errors become rejections carrying DynamoDB's own message; anything that
/// never reached the service is a transport failure.
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => StoreError::Rejected(
            service
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| service.to_string()),
        ),
        None => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

fn item_from_record(record: &InventoryRecord) -> Item {
    record
        .iter()
        .map(|(k, v)| (k.clone(), to_dynamo(v)))
        .collect()
}

fn record_from_item(item: Item) -> StoreResult<InventoryRecord> {
    item.into_iter()
        .map(|(k, v)| Ok((k, from_dynamo(v)?)))
        .collect()
}

fn to_dynamo(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Null => AttributeValue::Null(true),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::Number(d) => AttributeValue::N(d.to_string()),
        AttrValue::String(s) => AttributeValue::S(s.clone()),
        AttrValue::List(items) => AttributeValue::L(items.iter().map(to_dynamo).collect()),
        AttrValue::Map(map) => AttributeValue::M(item_from_record(map)),
        AttrValue::StringSet(items) => AttributeValue::Ss(items.clone()),
        AttrValue::NumberSet(items) => {
            AttributeValue::Ns(items.iter().map(BigDecimal::to_string).collect())
        }
        AttrValue::Binary(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
        AttrValue::BinarySet(items) => {
            AttributeValue::Bs(items.iter().cloned().map(Blob::new).collect())
        }
    }
}

fn from_dynamo(value: AttributeValue) -> StoreResult<AttrValue> {
    Ok(match value {
        AttributeValue::Null(_) => AttrValue::Null,
        AttributeValue::Bool(b) => AttrValue::Bool(b),
        AttributeValue::N(n) => AttrValue::Number(parse_number(&n)?),
        AttributeValue::S(s) => AttrValue::String(s),
        AttributeValue::L(items) => AttrValue::List(
            items
                .into_iter()
                .map(from_dynamo)
                .collect::<StoreResult<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => AttrValue::Map(record_from_item(map)?),
        AttributeValue::Ss(items) => AttrValue::StringSet(items),
        AttributeValue::Ns(items) => AttrValue::NumberSet(
            items
                .iter()
                .map(|n| parse_number(n))
                .collect::<StoreResult<Vec<_>>>()?,
        ),
        AttributeValue::B(blob) => AttrValue::Binary(blob.into_inner()),
        AttributeValue::Bs(blobs) => {
            AttrValue::BinarySet(blobs.into_iter().map(Blob::into_inner).collect())
        }
        other => return Err(StoreError::Decode(format!("unknown attribute {other:?}"))),
    })
}

fn parse_number(raw: &str) -> StoreResult<BigDecimal> {
    BigDecimal::from_str(raw).map_err(|_| StoreError::Decode(format!("'{raw}' is not a number")))
}
