mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use restroom_db::PgGeoStore;
use restroom_nearby::{AggregatorSettings, NearbyAggregator};
use restroom_places::PlacesClient;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(restroom_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting restroom-server");

    let pool_config = restroom_db::PoolConfig::from_app_config(&config);
    let pool = restroom_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = restroom_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let mut settings = AggregatorSettings::from_app_config(&config);
    let places = match config.places_api_key.as_deref() {
        Some(key) => {
            let client = PlacesClient::new(key, config.places_timeout_secs)?
                .with_retry_policy(config.places_max_retries, config.places_retry_backoff_base_ms);
            settings.places_timeout = client.call_budget();
            tracing::info!(
                budget_secs = settings.places_timeout.as_secs_f64(),
                "places provider enabled"
            );
            Some(client)
        }
        None => {
            tracing::warn!(
                "GOOGLE_PLACES_API_KEY not set; nearby results will be internal-only"
            );
            None
        }
    };

    let store = PgGeoStore::from_app_config(pool.clone(), &config);
    let aggregator = Arc::new(NearbyAggregator::new(store, places, settings));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&aggregator)).await?;

    let app = build_app(AppState { pool, aggregator }, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
