use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proxy-integration response returned to the invoker.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded `CounterBody`.
    pub body: String,
}

/// Response body. Which counters are present depends on the outcome.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CounterBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_counter: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_counter: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_counter: Option<i64>,
}

impl CounterBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}
