use std::sync::Arc;

use crate::error::StoreError;
use crate::store::Table;
use crate::util::number_attr;

pub const COUNT_ATTR: &str = "count";

/// Reads and writes the single counter record.
#[derive(Clone)]
pub struct CounterStore {
    table: Arc<dyn Table>,
    hash_value: String,
}

impl CounterStore {
    pub fn new(table: Arc<dyn Table>, hash_value: impl Into<String>) -> Self {
        Self {
            table,
            hash_value: hash_value.into(),
        }
    }

    pub async fn read_counter(&self) -> Result<i64, StoreError> {
        let item = self.table.get_item(&self.hash_value).await?;
        let Some(item) = item else {
            tracing::error!(hash_value = %self.hash_value, "counter record not found");
            return Err(StoreError::NotFoundOrMalformed(
                "The DynamoDB entry was not found.".into(),
            ));
        };
        match number_attr(&item, COUNT_ATTR) {
            Some(n) if n >= 0 => Ok(n),
            _ => {
                tracing::error!(hash_value = %self.hash_value, "counter record has invalid content");
                Err(StoreError::NotFoundOrMalformed(
                    "The DynamoDB entry was found but has invalid content.".into(),
                ))
            }
        }
    }

    /// Overwrite `count`; last writer wins.
    pub async fn write_counter(&self, new_value: i64) -> Result<i64, StoreError> {
        self.table
            .set_number(&self.hash_value, COUNT_ATTR, new_value)
            .await?;
        tracing::info!(new_value, "counter updated");
        Ok(new_value)
    }

    /// Single `ADD` update; returns the value the store now holds.
    pub async fn increment_counter(&self) -> Result<i64, StoreError> {
        let attrs = self
            .table
            .add_number(&self.hash_value, COUNT_ATTR, 1)
            .await?;
        let new_value = number_attr(&attrs, COUNT_ATTR).ok_or_else(|| {
            StoreError::NotFoundOrMalformed("increment returned no numeric count".into())
        })?;
        tracing::info!(new_value, "counter incremented");
        Ok(new_value)
    }
}
