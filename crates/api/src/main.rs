use std::sync::Arc;

use anyhow::Context;

use paytv_infra::billing_service::BillingService;
use paytv_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    paytv_observability::init(config.log_format);

    let services = Arc::new(BillingService::from_config(&config)?);
    let app = paytv_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
