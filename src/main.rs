use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;
use schoolyard::logging::{init_tracing, shutdown_tracer};
use schoolyard::metrics::{init_metrics, metrics_app};
use schoolyard::router::init_router;
use schoolyard::state::init_app_state;
use schoolyard_config::ServerConfig;
use tracing::{error, info, warn};

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();
    let state = init_app_state().await?;

    if server_config.run_migrations {
        schoolyard_db::run_migrations(&state.db).await?;
    }

    match init_metrics() {
        Ok(Some(handle)) => {
            let metrics_addr = server_config.metrics_address();
            match tokio::net::TcpListener::bind(&metrics_addr).await {
                Ok(listener) => {
                    info!(address = %metrics_addr, "Metrics endpoint listening");
                    tokio::spawn(async move {
                        if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                            error!(error = %e, "Metrics server stopped");
                        }
                    });
                }
                Err(e) => warn!(address = %metrics_addr, error = %e, "Could not bind metrics port"),
            }
        }
        Ok(None) => info!("Observability disabled, metrics endpoint not started"),
        Err(e) => warn!(error = %e, "Failed to install Prometheus recorder"),
    }

    let limiters = state.rate_limiters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiters.retain_recent();
        }
    });

    let app = init_router(state);
    let address = server_config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Server running");
    info!("Swagger UI available at http://{}/swagger-ui", address);
    info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
