use storefront_api::{ApiServer, ServerConfig};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let result = match ApiServer::build(config).await {
        Ok(server) => server.serve().await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        error!(error = %err, "server failed");
        std::process::exit(1);
    }
}
