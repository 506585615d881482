mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use autoprice_scraper::{Engine, EngineSettings};

use crate::{
    api::{build_app, default_reconcile_limiter, AppState},
    middleware::ApiKeys,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = autoprice_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = autoprice_core::load_catalog(&config.catalog_path)?;
    tracing::info!(
        path = %config.catalog_path.display(),
        brands = catalog.brands.len(),
        "catalog loaded"
    );

    let engine = Engine::new(&EngineSettings::from_app_config(&config))?;

    let keys = ApiKeys::from_env(matches!(
        config.env,
        autoprice_core::Environment::Development
    ))?;
    let state = AppState {
        engine: Arc::new(engine),
        catalog: Arc::new(catalog),
    };
    tracing::info!(api_keys = keys.is_enforced(), "reconcile route auth configured");
    let app = build_app(state, keys, default_reconcile_limiter());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
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
