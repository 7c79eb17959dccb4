use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::ProvideErrorMetadata; // for .code()
use ddb::types::{AttributeValue as Av, ReturnValue};

use crate::error::{map_ddb_err, StoreError};

#[cfg(test)]
pub(crate) mod memory;

pub type Item = HashMap<String, Av>;

/// The few key-value operations the accessors need, against one table
/// keyed by a single string hash key.
#[async_trait]
pub trait Table: Send + Sync {
    /// Name of the hash-key attribute.
    fn hash_key(&self) -> &str;

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// `SET #attr = :v` on an existing item, leaving other attributes alone.
    async fn set_number(&self, key: &str, attr: &str, value: i64) -> Result<(), StoreError>;

    /// `ADD #attr :delta`; returns the updated attributes.
    async fn add_number(&self, key: &str, attr: &str, delta: i64) -> Result<Item, StoreError>;

    /// Put `item` unless an item with the same key exists whose numeric
    /// `expiry_attr` is not yet past `now_ms`. Returns `false` when a live
    /// item blocked the put.
    async fn put_unless_live(
        &self,
        item: Item,
        expiry_attr: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct DynamoTable {
    ddb: ddb::Client,
    table: String,
    hash_key: String,
}

impl DynamoTable {
    pub fn new(ddb: ddb::Client, table: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            ddb,
            table: table.into(),
            hash_key: hash_key.into(),
        }
    }
}

#[async_trait]
impl Table for DynamoTable {
    fn hash_key(&self) -> &str {
        &self.hash_key
    }

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        let r = self
            .ddb
            .get_item()
            .table_name(&self.table)
            .key(&self.hash_key, Av::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_ddb_err)?;
        Ok(r.item)
    }

    async fn set_number(&self, key: &str, attr: &str, value: i64) -> Result<(), StoreError> {
        self.ddb
            .update_item()
            .table_name(&self.table)
            .key(&self.hash_key, Av::S(key.to_string()))
            .update_expression("SET #C = :c")
            .expression_attribute_names("#C", attr)
            .expression_attribute_values(":c", Av::N(value.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_ddb_err)?;
        Ok(())
    }

    async fn add_number(&self, key: &str, attr: &str, delta: i64) -> Result<Item, StoreError> {
        let resp = self
            .ddb
            .update_item()
            .table_name(&self.table)
            .key(&self.hash_key, Av::S(key.to_string()))
            .update_expression("ADD #C :inc")
            .expression_attribute_names("#C", attr)
            .expression_attribute_values(":inc", Av::N(delta.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_ddb_err)?;
        Ok(resp.attributes.unwrap_or_default())
    }

    async fn put_unless_live(
        &self,
        item: Item,
        expiry_attr: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let r = self
            .ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .condition_expression(
                "attribute_not_exists(#k) OR NOT attribute_type(#e, :num) OR #e < :now",
            )
            .expression_attribute_names("#k", &self.hash_key)
            .expression_attribute_names("#e", expiry_attr)
            .expression_attribute_values(":num", Av::S("N".into()))
            .expression_attribute_values(":now", Av::N(now_ms.to_string()))
            .send()
            .await;

        match r {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.code() == Some("ConditionalCheckFailedException") {
                    return Ok(false);
                }
                Err(map_ddb_err(e))
            }
        }
    }
}
