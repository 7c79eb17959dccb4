use aws_sdk_dynamodb::error::ProvideErrorMetadata; // for .code() / .message()
use thiserror::Error;

/// Failures surfaced by the table accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transport or service failure reported by the store.
    #[error("store error: {message}")]
    Backend { message: String },

    /// The record is missing or does not have the expected shape.
    #[error("{0}")]
    NotFoundOrMalformed(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
        }
    }
}

/// Build a `Backend` error from an SDK error, keeping the service message
/// when the store returned one.
pub(crate) fn map_ddb_err<E>(e: E) -> StoreError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let message = match e.message() {
        Some(m) => m.to_string(),
        None => e.to_string(),
    };
    tracing::error!(err_code = ?e.code(), err_msg = %message, "ddb call failed");
    StoreError::backend(message)
}

/// Startup configuration problems. None of these can be answered with a
/// response, so `main` exits with them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    ConfigurationMissing(&'static str),

    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}
