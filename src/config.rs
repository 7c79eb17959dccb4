use crate::error::ConfigError;

/// Counter table coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterTableConfig {
    pub table_name: String,
    pub hash_key: String,
    /// Hash-key value of the single counter record.
    pub hash_value: String,
}

/// Visitor table coordinates. Present only when deduplication is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorTableConfig {
    pub table_name: String,
    pub hash_key: String,
}

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub counter: CounterTableConfig,
    pub visitors: Option<VisitorTableConfig>,
    pub atomic_increment: bool,
    pub cors_allow_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |k: &'static str| get(k).ok_or(ConfigError::ConfigurationMissing(k));

        let counter = CounterTableConfig {
            table_name: require("TABLE_NAME")?,
            hash_key: require("HASH_KEY")?,
            hash_value: require("HASH_VALUE")?,
        };

        let visitors = match (get("VISITOR_TABLE_NAME"), get("VISITOR_HASH_KEY")) {
            (Some(table_name), Some(hash_key)) => Some(VisitorTableConfig {
                table_name,
                hash_key,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: "VISITOR_TABLE_NAME",
                    missing: "VISITOR_HASH_KEY",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: "VISITOR_HASH_KEY",
                    missing: "VISITOR_TABLE_NAME",
                })
            }
        };

        let atomic_increment = match get("ATOMIC_INCREMENT") {
            Some(v) => parse_flag("ATOMIC_INCREMENT", &v)?,
            None => false,
        };

        Ok(Self {
            counter,
            visitors,
            atomic_increment,
            cors_allow_origin: get("CORS_ALLOW_ORIGIN"),
        })
    }

    pub fn dedup_enabled(&self) -> bool {
        self.visitors.is_some()
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}
