use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue as Av;

use super::{Item, Table};
use crate::error::StoreError;
use crate::util::number_attr;

/// In-memory `Table` with fault injection and an operation log.
pub(crate) struct MemoryTable {
    hash_key: String,
    items: Mutex<HashMap<String, Item>>,
    ops: Mutex<Vec<&'static str>>,
    after_get: Mutex<Vec<(String, String, Av)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryTable {
    pub(crate) fn new(hash_key: &str) -> Self {
        Self {
            hash_key: hash_key.to_string(),
            items: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            after_get: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_number(self, key: &str, attr: &str, value: i64) -> Self {
        self.insert(key, attr, Av::N(value.to_string()));
        self
    }

    pub(crate) fn insert(&self, key: &str, attr: &str, value: Av) {
        let mut items = self.items.lock().unwrap();
        let item = items.entry(key.to_string()).or_insert_with(|| {
            Item::from([(self.hash_key.clone(), Av::S(key.to_string()))])
        });
        item.insert(attr.to_string(), value);
    }

    /// Apply `insert(key, attr, value)` right after the next `get_item`
    /// has read, as a concurrent writer would.
    pub(crate) fn insert_after_get(&self, key: &str, attr: &str, value: Av) {
        self.after_get
            .lock()
            .unwrap()
            .push((key.to_string(), attr.to_string(), value));
    }

    pub(crate) fn item(&self, key: &str) -> Option<Item> {
        self.items.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn number(&self, key: &str, attr: &str) -> Option<i64> {
        self.item(key).as_ref().and_then(|it| number_attr(it, attr))
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub(crate) fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Names of the operations issued so far, in order.
    pub(crate) fn ops(&self) -> Vec<&'static str> {
        self.ops.lock().unwrap().clone()
    }

    pub(crate) fn count_ops(&self, op: &str) -> usize {
        self.ops().iter().filter(|o| **o == op).count()
    }

    fn record(&self, op: &'static str) {
        self.ops.lock().unwrap().push(op);
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("simulated read failure"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("simulated write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Table for MemoryTable {
    fn hash_key(&self) -> &str {
        &self.hash_key
    }

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        self.record("get");
        self.check_read()?;
        let found = self.item(key);
        let pending: Vec<_> = self.after_get.lock().unwrap().drain(..).collect();
        for (k, attr, value) in pending {
            self.insert(&k, &attr, value);
        }
        Ok(found)
    }

    async fn set_number(&self, key: &str, attr: &str, value: i64) -> Result<(), StoreError> {
        self.record("set");
        self.check_write()?;
        self.insert(key, attr, Av::N(value.to_string()));
        Ok(())
    }

    async fn add_number(&self, key: &str, attr: &str, delta: i64) -> Result<Item, StoreError> {
        self.record("add");
        self.check_write()?;
        let next = self.number(key, attr).unwrap_or(0) + delta;
        self.insert(key, attr, Av::N(next.to_string()));
        Ok(Item::from([(attr.to_string(), Av::N(next.to_string()))]))
    }

    async fn put_unless_live(
        &self,
        item: Item,
        expiry_attr: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        self.record("put");
        self.check_write()?;
        let key = match item.get(&self.hash_key).and_then(|v| v.as_s().ok()) {
            Some(k) => k.clone(),
            None => return Err(StoreError::backend("missing hash key in item")),
        };
        let mut items = self.items.lock().unwrap();
        if let Some(existing) = items.get(&key) {
            // Same semantics as the DynamoDB condition in `DynamoTable`.
            let expired = number_attr(existing, expiry_attr)
                .map(|e| e < now_ms)
                .unwrap_or(true);
            if !expired {
                return Ok(false);
            }
        }
        items.insert(key, item);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visitor(ip: &str, expiry: i64) -> Item {
        Item::from([
            ("ip".to_string(), Av::S(ip.to_string())),
            ("expiry_date".to_string(), Av::N(expiry.to_string())),
        ])
    }

    #[tokio::test]
    async fn live_record_blocks_put() {
        let table = MemoryTable::new("ip");
        table.insert("1.2.3.4", "expiry_date", Av::N("200".into()));
        let put = table.put_unless_live(visitor("1.2.3.4", 900), "expiry_date", 100).await;
        assert_eq!(put, Ok(false));
        assert_eq!(table.number("1.2.3.4", "expiry_date"), Some(200));
    }

    #[tokio::test]
    async fn record_without_numeric_expiry_does_not_block_put() {
        let table = MemoryTable::new("ip");
        table.insert("1.2.3.4", "note", Av::S("legacy".into()));
        let put = table.put_unless_live(visitor("1.2.3.4", 900), "expiry_date", 100).await;
        assert_eq!(put, Ok(true));
        assert_eq!(table.number("1.2.3.4", "expiry_date"), Some(900));

        table.insert("5.6.7.8", "expiry_date", Av::S("later".into()));
        let put = table.put_unless_live(visitor("5.6.7.8", 900), "expiry_date", 100).await;
        assert_eq!(put, Ok(true));
    }

    #[tokio::test]
    async fn insert_after_get_lands_after_the_read() {
        let table = MemoryTable::new("ip");
        table.insert_after_get("1.2.3.4", "expiry_date", Av::N("5".into()));
        assert_eq!(table.get_item("1.2.3.4").await, Ok(None));
        assert_eq!(table.number("1.2.3.4", "expiry_date"), Some(5));
    }
}
