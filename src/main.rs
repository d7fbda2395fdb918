use chat_gateway::{AdmissionController, Args, handlers, state::AppState};
use clap::Parser; // for cli
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();
    let config = args.admission_config()?;
    let reclaim_every = config.reclaim_period();

    info!(
        "Rate limit: {} requests per {:?}, quota: {} units per {:?}",
        config.request_limit(),
        config.request_window_duration(),
        config.resource_limit(),
        config.resource_window_duration()
    );

    let admission = Arc::new(AdmissionController::in_memory(config)?);
    let reclaimer = admission.reclaimer().spawn(reclaim_every)?;

    // creating shared state
    let state = Arc::new(AppState::new(&args.upstream, admission));
    info!("Forwarding to chat backend at {}", state.upstream);

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway running on http://localhost:{}", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    reclaimer.shutdown().await;
    Ok(())
}
