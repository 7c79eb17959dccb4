use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue as Av;

use crate::error::StoreError;
use crate::store::{Item, Table};
use crate::util::{epoch_now_ms, number_attr};

pub const EXPIRY_ATTR: &str = "expiry_date";

/// 30 days in milliseconds.
pub const DEDUP_WINDOW_MS: i64 = 30 * 24 * 3600 * 1000;

/// Remembers visitor identifiers for the dedup window. Expired records are
/// purged by the table's TTL on `expiry_date`.
#[derive(Clone)]
pub struct VisitorTracker {
    table: Arc<dyn Table>,
}

impl VisitorTracker {
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }

    /// `true` when `identifier` has no live record; a fresh record is then
    /// registered. Lookup failures are errors, never "not found".
    pub async fn is_new_visitor(&self, identifier: &str) -> Result<bool, StoreError> {
        self.is_new_visitor_at(identifier, epoch_now_ms()).await
    }

    pub(crate) async fn is_new_visitor_at(
        &self,
        identifier: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        if let Some(item) = self.table.get_item(identifier).await? {
            // TTL deletion lags, so a past expiry may still be readable. TTL
            // never purges a record without a numeric expiry; it is replaced.
            match number_attr(&item, EXPIRY_ATTR) {
                Some(exp) if exp >= now_ms => {
                    tracing::info!(visitor = %identifier, "visitor seen within window");
                    return Ok(false);
                }
                exp => {
                    tracing::debug!(visitor = %identifier, expiry = ?exp, "stale visitor record")
                }
            }
        }

        let expiry = now_ms + DEDUP_WINDOW_MS;
        let item = Item::from([
            (
                self.table.hash_key().to_string(),
                Av::S(identifier.to_string()),
            ),
            (EXPIRY_ATTR.to_string(), Av::N(expiry.to_string())),
        ]);
        let inserted = self.table.put_unless_live(item, EXPIRY_ATTR, now_ms).await?;
        if inserted {
            tracing::info!(visitor = %identifier, expiry, "registered new visitor");
        } else {
            tracing::info!(visitor = %identifier, "visitor registered concurrently");
        }
        Ok(inserted)
    }
}
