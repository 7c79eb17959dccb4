use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value as Json;
use tracing_subscriber::EnvFilter;
use visitor_counter::{config::Config, handler};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    // Missing configuration stops the cold start here.
    let config = Config::from_env()?;
    tracing::info!(
        table = %config.counter.table_name,
        dedup = config.dedup_enabled(),
        atomic = config.atomic_increment,
        "visitor counter starting"
    );

    let ctx = handler::Ctx::new(&config).await;

    run(service_fn(move |event: LambdaEvent<Json>| {
        let ctx = ctx.clone();
        async move { handler::handler(event, &ctx).await }
    }))
    .await
}
