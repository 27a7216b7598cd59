use gauntlet::{config::Config, logging, runtime::Runtime};
use tracing::error;

#[tokio::main]
async fn main() {
    // Local development reads a .env file; deployments set real environment variables.
    let _ = dotenvy::dotenv();
    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "configuration error");
            std::process::exit(1);
        }
    };

    let runtime = match Runtime::build(config).await {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(%err, "failed to build runtime");
            std::process::exit(1);
        }
    };

    runtime.run().await;
}
