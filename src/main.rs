use data_loader::{config::JobConfig, domain::models::JobResult, lambda_service::LambdaService};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, debug, error};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "data_loader=debug,aws_config=warn,aws_smithy_runtime=warn,sqlx=warn";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_target(false)
        .with_ansi(!in_lambda)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting data loader");
    let config = match JobConfig::from_env() {
        Ok(config) => config,
        Err(e) if in_lambda => {
            // Keep answering invocations so each one still gets a result.
            error!("Invalid configuration, every invocation will fail: {}", e);
            let result = JobResult::failure(&e);
            return run(service_fn(|_: LambdaEvent<Value>| {
                let result = result.clone();
                async move { Ok::<JobResult, Error>(result) }
            }))
            .await;
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    debug!("Running inside Lambda: {}", in_lambda);

    let service = LambdaService::new(config).await;

    if in_lambda {
        return run(service_fn(|event| service.handle(event))).await;
    }

    let result = service.build_job().run().await;
    println!("{}", serde_json::to_string(&result)?);
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
