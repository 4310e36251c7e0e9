use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use job_scraper::api::{self, AppState};
use job_scraper::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("job_scraper=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        portal = %config.scrape.portal_url,
        workers = config.scrape.worker_count,
        headless = config.scrape.headless,
        "Configuration loaded"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let app = api::router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI at /swagger-ui");
    axum::serve(listener, app).await?;

    Ok(())
}
