mod scheduler;

use std::sync::Arc;

use adscout_core::{Clock, SystemClock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(adscout_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "server: starting");

    let pool_config = adscout_store::PoolConfig::from_app_config(&config);
    let pool = adscout_store::connect_pool(&config.database_url, pool_config).await?;
    adscout_store::health_check(&pool).await?;
    adscout_store::run_migrations(&pool).await?;

    let store = Arc::new(adscout_store::PgDocumentStore::new(pool));
    let pipeline = Arc::new(adscout_pipeline::build_pipeline(&config, store)?);

    let offset = adscout_pipeline::utc_offset(config.scheduler_utc_offset_hours)
        .ok_or_else(|| anyhow::anyhow!("scheduler UTC offset out of range"))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut registry = scheduler::build_registry(pipeline, offset, clock).await?;

    for (name, state) in registry.status() {
        if let Some(next) = state.next_fire {
            tracing::info!(job = %name, next_fire = %next.with_timezone(&offset), "server: job scheduled");
        }
    }

    shutdown_signal().await;

    registry.stop_all().await?;
    tracing::info!("server: stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "server: failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "server: failed to install SIGTERM handler");
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

    tracing::info!("received shutdown signal, stopping scheduler");
}
