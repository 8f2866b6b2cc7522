use anyhow::Result;
use std::sync::Arc;

mod clients;
mod config;
mod error;
mod logging;
mod render;
mod routes;
mod services;
mod state;
pub mod models;

use clients::HttpBackend;
use services::Dashboard;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    // Build our application state
    let backend = HttpBackend::new(&config.backend_url, config.request_timeout)?;
    let state = Arc::new(AppState::new(config, Arc::new(backend)));
    let addr = state.config.bind_addr;

    let app = routes::router(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    pub config: config::Config,
    pub dashboard: Dashboard,
}

impl AppState {
    fn new(config: config::Config, backend: Arc<dyn clients::Backend>) -> Self {
        Self {
            config,
            dashboard: Dashboard::new(backend),
        }
    }
}
