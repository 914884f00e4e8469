use habit_grid::{AppState, Config, HttpHabitApi, LocalClock, SessionStore, router};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let session = SessionStore::open(config.session_path.clone()).await;
    let api = HttpHabitApi::new(
        config.api_base_url.clone(),
        config.request_timeout,
        session.clone(),
    )?;

    let state = AppState::new(
        Arc::new(api),
        Arc::new(LocalClock),
        session,
        config.google_redirect_url(),
    );
    let app = router(state);

    let addr = config.bind_addr();
    info!(api = %config.api_base_url, "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
