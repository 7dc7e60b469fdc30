use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use glpi_reports_api::{app, config, middleware, services::GotenbergClient};
use persistence::repositories::MetricsRepository;
use tracing::info;

/// How often connection pool gauges are refreshed.
const POOL_METRICS_PERIOD: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting GLPI Reports API v{}", env!("CARGO_PKG_VERSION"));

    // Connections are opened on first use; GLPI may come up after us.
    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config)?;

    let pool_for_metrics = pool.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POOL_METRICS_PERIOD);
        loop {
            ticker.tick().await;
            persistence::metrics::record_pool_metrics(&pool_for_metrics);
        }
    });

    let metrics_source = Arc::new(MetricsRepository::new(pool));
    let pdf_backend = Arc::new(GotenbergClient::new(&config.pdf)?);
    info!(backend = %config.pdf.backend_url, "PDF backend configured");

    let addr = config.socket_addr()?;
    let app = app::create_app(config, metrics_source, pdf_backend);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
