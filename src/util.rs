use aws_sdk_dynamodb::types::AttributeValue as Av;
use chrono::Utc;
use serde_json::Value as Json;
use std::collections::HashMap;

pub fn epoch_now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Numeric attribute as i64; `None` when absent, not an `N`, or unparsable.
pub fn number_attr(item: &HashMap<String, Av>, name: &str) -> Option<i64> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}

/// Non-empty string found by walking `path` through nested JSON objects.
pub fn str_at<'a>(v: &'a Json, path: &[&str]) -> Option<&'a str> {
    let mut cur = v;
    for p in path {
        cur = cur.get(*p)?;
    }
    cur.as_str().map(str::trim).filter(|s| !s.is_empty())
}
