use std::collections::BTreeMap;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb as ddb;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value as Json;

use crate::{
    config::Config,
    counter::CounterStore,
    error::StoreError,
    model::{ApiResponse, CounterBody},
    store::{DynamoTable, Table},
    util::str_at,
    visitors::VisitorTracker,
};

pub const MSG_READ_FAILED: &str = "Unable to retrieve DynamoDB counter value";
pub const MSG_WRITE_FAILED: &str = "Unable to update the visitor counter";
pub const MSG_UPDATED: &str = "Successfully updated the visitor counter.";
pub const MSG_ALREADY_VISITED: &str =
    "Visitor has already visited within the last 30 days, counter not updated.";

#[derive(Clone)]
pub struct Ctx {
    pub counter: CounterStore,
    /// `None` runs the single-table variant without deduplication.
    pub visitors: Option<VisitorTracker>,
    pub atomic_increment: bool,
    pub cors_allow_origin: Option<String>,
}

impl Ctx {
    pub async fn new(config: &Config) -> Self {
        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = ddb::Client::new(&aws);

        let counter: Arc<dyn Table> = Arc::new(DynamoTable::new(
            client.clone(),
            &config.counter.table_name,
            &config.counter.hash_key,
        ));
        let visitors = config.visitors.as_ref().map(|v| {
            Arc::new(DynamoTable::new(client.clone(), &v.table_name, &v.hash_key)) as Arc<dyn Table>
        });
        Self::from_tables(config, counter, visitors)
    }

    pub fn from_tables(
        config: &Config,
        counter: Arc<dyn Table>,
        visitors: Option<Arc<dyn Table>>,
    ) -> Self {
        Self {
            counter: CounterStore::new(counter, &config.counter.hash_value),
            visitors: visitors.map(VisitorTracker::new),
            atomic_increment: config.atomic_increment,
            cors_allow_origin: config.cors_allow_origin.clone(),
        }
    }
}

/// Lambda entry point. Every outcome is a response; store failures never
/// surface as invocation errors.
pub async fn handler(event: LambdaEvent<Json>, ctx: &Ctx) -> Result<ApiResponse, Error> {
    tracing::info!(request_id = %event.context.request_id, "visitor counter invoked");
    Ok(handle(&event.payload, ctx).await)
}

pub async fn handle(event: &Json, ctx: &Ctx) -> ApiResponse {
    tracing::info!("Getting the current visitor counter value...");
    let current = match ctx.counter.read_counter().await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "counter read failed");
            return respond(ctx, 500, CounterBody::message(MSG_READ_FAILED));
        }
    };
    tracing::info!(current, "The current counter value");

    if let (Some(visitors), Some(ip)) = (&ctx.visitors, source_ip(event)) {
        match visitors.is_new_visitor(ip).await {
            Ok(true) => {}
            Ok(false) => {
                return respond(
                    ctx,
                    200,
                    CounterBody {
                        current_counter: Some(current),
                        ..CounterBody::message(MSG_ALREADY_VISITED)
                    },
                );
            }
            Err(e) => {
                tracing::error!(error = %e, visitor = %ip, "visitor lookup failed");
                return respond(ctx, 500, CounterBody::message(MSG_READ_FAILED));
            }
        }
    }

    let written = match current.checked_add(1) {
        None => Err(StoreError::NotFoundOrMalformed(
            "counter is at its maximum value".into(),
        )),
        Some(_) if ctx.atomic_increment => ctx.counter.increment_counter().await,
        Some(next) => ctx.counter.write_counter(next).await,
    };

    match written {
        Ok(new_value) => respond(ctx, 200, updated_body(ctx, current, new_value)),
        Err(e) => {
            log_write_failure(&e);
            respond(
                ctx,
                500,
                CounterBody {
                    current_counter: Some(current),
                    ..CounterBody::message(MSG_WRITE_FAILED)
                },
            )
        }
    }
}

fn updated_body(ctx: &Ctx, old: i64, new_value: i64) -> CounterBody {
    if ctx.visitors.is_some() {
        CounterBody {
            current_counter: Some(new_value),
            old_counter: Some(old),
            ..CounterBody::message(MSG_UPDATED)
        }
    } else {
        CounterBody {
            new_counter: Some(new_value),
            ..CounterBody::message(MSG_UPDATED)
        }
    }
}

fn log_write_failure(e: &StoreError) {
    match e {
        StoreError::Backend { message } => {
            tracing::error!(err_msg = %message, "counter update failed")
        }
        StoreError::NotFoundOrMalformed(m) => {
            tracing::error!(err_msg = %m, "counter update returned bad content")
        }
    }
}

/// Caller address: REST API events carry it under `identity`, HTTP API
/// (v2) events under `http`.
pub fn source_ip(event: &Json) -> Option<&str> {
    str_at(event, &["requestContext", "identity", "sourceIp"])
        .or_else(|| str_at(event, &["requestContext", "http", "sourceIp"]))
}

fn respond(ctx: &Ctx, status: u16, body: CounterBody) -> ApiResponse {
    let mut headers = BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]);
    if let Some(origin) = &ctx.cors_allow_origin {
        headers.insert("Access-Control-Allow-Origin".into(), origin.clone());
    }
    // A struct of strings and integers always serializes.
    let body = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
    ApiResponse {
        status_code: status,
        headers,
        body,
    }
}
